//! Core ledger functionality
//!
//! The ledger entities and their hashing, monetary units, the consensus rule
//! set with its proof-of-work implementation, and the miner.

pub mod block;
pub mod consensus;
pub mod miner;
pub mod monetary;
pub mod proof_of_work;
pub mod transaction;
pub mod types;

pub use block::{Block, BlockHeader, GENESIS_PREVIOUS_HASH};
pub use consensus::Consensus;
pub use miner::{search_nonce, Miner};
pub use monetary::{INITIAL_BLOCK_REWARD, UNIT_MULTIPLIER};
pub use proof_of_work::ProofOfWork;
pub use transaction::{
    Transaction, TransactionInput, TransactionInputVerification, TransactionOutput,
    TransactionOutputPointer,
};
pub use types::{Address, Hash, Signature, Target};
