use crate::core::types::Address;
use crate::error::Result;
use crate::utils::new_key_pair;
use std::fmt;
use zeroize::ZeroizeOnDrop;

/// PKCS#8 private key bytes, wiped from memory on drop
#[derive(Clone, ZeroizeOnDrop)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// An ECDSA P-256 key pair and the address derived from its public key
#[derive(Debug, Clone)]
pub struct Account {
    address: Address,
    public_key: Vec<u8>,
    private_key: PrivateKey,
}

impl Account {
    pub fn new() -> Result<Account> {
        let (pkcs8, public_key) = new_key_pair()?;
        Ok(Account {
            address: Address::from_public_key(&public_key),
            public_key,
            private_key: PrivateKey(pkcs8),
        })
    }

    pub fn get_address(&self) -> Address {
        self.address
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}
