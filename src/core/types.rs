//! Fixed-size ledger primitives: hashes, addresses, proof-of-work targets and
//! input signatures.

use crate::error::{BlockchainError, Result};
use crate::utils::{encode, sha256_digest};
use bincode::{Decode, Encode};
use data_encoding::HEXLOWER;
use num_bigint::BigUint;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const HASH_LENGTH: usize = 32;
pub const ADDRESS_LENGTH: usize = 32;
/// A target stores the high-order prefix of the value a block hash is compared to.
pub const TARGET_LENGTH: usize = 4;

/// A 32-byte SHA-256 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Encode, Decode)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl Hash {
    pub fn digest(data: &[u8]) -> Hash {
        Hash(sha256_digest(data))
    }

    /// Hash of the canonical encoding of `value`
    pub fn of<T: Encode>(value: &T) -> Hash {
        Hash::digest(&encode(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0)
    }

    pub fn from_hex(hex: &str) -> Result<Hash> {
        decode_fixed_hex(hex).map(Hash)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A 32-byte account identifier; for accounts, the hash of the encoded public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Encode, Decode)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    pub fn from_public_key(public_key: &[u8]) -> Address {
        Address(sha256_digest(public_key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0)
    }

    pub fn from_hex(hex: &str) -> Result<Address> {
        decode_fixed_hex(hex).map(Address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn decode_fixed_hex<const N: usize>(hex: &str) -> Result<[u8; N]> {
    let bytes = HEXLOWER
        .decode(hex.to_ascii_lowercase().as_bytes())
        .map_err(|e| BlockchainError::Serialization(format!("Invalid hex: {e}")))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        BlockchainError::Serialization(format!("Expected {N} bytes, got {}", bytes.len()))
    })
}

macro_rules! hex_serde {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let hex = String::deserialize(deserializer)?;
                $ty::from_hex(&hex).map_err(D::Error::custom)
            }
        }
    };
}

hex_serde!(Hash);
hex_serde!(Address);

/// Proof-of-work target.
///
/// The 4 stored bytes are the high-order prefix of a 32-byte comparison value
/// whose remaining bytes are all `0xFF`. A larger prefix is therefore a looser
/// target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode,
)]
pub struct Target(pub [u8; TARGET_LENGTH]);

impl Target {
    /// Full-width comparison value: `prefix ++ 0xFF * 28`
    pub fn expand(&self) -> Hash {
        let mut full = [0xFFu8; HASH_LENGTH];
        full[..TARGET_LENGTH].copy_from_slice(&self.0);
        Hash(full)
    }

    /// True iff `hash`, read as a big-endian unsigned integer, is strictly
    /// below the expanded target.
    pub fn is_met_by(&self, hash: &Hash) -> bool {
        let hash_int = BigUint::from_bytes_be(hash.as_bytes());
        let target_int = BigUint::from_bytes_be(self.expand().as_bytes());
        hash_int < target_int
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&HEXLOWER.encode(&self.0))
    }
}

/// ECDSA signature bytes over an output pointer
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Encode, Decode,
)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Signature(bytes)
    }
}
