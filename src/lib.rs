//! # Testcoin
//!
//! A single-node educational cryptocurrency engine: a UTXO ledger, a
//! proof-of-work rule set and a miner.
//!
//! ## Layout
//! - `core/`: ledger entities and hashing, consensus rules, proof of work, the miner
//! - `storage/`: the in-memory chain store and its pending pool
//! - `wallet/`: accounts (key pairs and addresses)
//! - `node/`: one chain behind a lock, with submission, mining and commit
//! - `config/`: protocol parameters and miner settings
//! - `utils/`: hashing, signatures and the canonical byte encoding
//! - `cli/`: arguments for the driver binary
//!
//! ## Flow
//! A transaction is validated against the chain and enters the pending pool.
//! The miner picks pending transactions by fee, adds a coinbase and searches
//! for a nonce. The solved block is validated again and only then committed.
//!
//! Every hash is taken over the canonical encoding in `utils::serialization`;
//! changing a field's order or width changes every block and transaction id.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod node;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{MinerConfig, ProtocolParams, Settings, CURRENT_PROTOCOL_VERSION};
pub use core::{
    Address, Block, BlockHeader, Consensus, Hash, Miner, ProofOfWork, Signature, Target,
    Transaction, TransactionInput, TransactionOutput, TransactionOutputPointer,
};
pub use error::{BlockchainError, Result};
pub use node::{ChainSummary, Node};
pub use storage::{Chain, MemoryPool};
pub use utils::{
    current_timestamp, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify,
    new_key_pair, sha256_digest,
};
pub use wallet::Account;
