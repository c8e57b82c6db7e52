//! In-memory ledger state
//!
//! The chain store (blocks, confirmed transactions, the UTXO index) and the
//! ordered pool of pending transactions it owns.

pub mod chain;
pub mod memory_pool;

pub use chain::Chain;
pub use memory_pool::MemoryPool;
