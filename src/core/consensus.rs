use crate::core::types::Signature;
use crate::core::{Block, Transaction, TransactionOutputPointer};
use crate::error::Result;
use crate::storage::Chain;
use crate::wallet::PrivateKey;

/// The rules a block and its transactions must satisfy before the chain store
/// commits them.
///
/// Validation never panics and never mutates the chain it is given; every
/// rejection is `false`. Proof-of-work is one implementation.
pub trait Consensus {
    /// Sign the canonical encoding of `pointer`, proving ownership of the output.
    fn sign_input(&self, private_key: &PrivateKey, pointer: &TransactionOutputPointer)
        -> Result<Signature>;

    fn verify_input(
        &self,
        public_key: &[u8],
        pointer: &TransactionOutputPointer,
        signature: &Signature,
    ) -> bool;

    /// Every input is signed by the owner of an unspent output and the inputs
    /// cover the outputs.
    fn validate_pending_transaction(&self, chain: &Chain, tx: &Transaction) -> bool;

    /// A coinbase for the block after the chain's last block
    fn validate_coinbase_transaction(&self, chain: &Chain, coinbase: &Transaction) -> bool;

    /// Whether `block` may extend `chain`
    fn validate_block(&self, chain: &Chain, block: &Block) -> bool;
}
