//! Configuration management
//!
//! Protocol parameters (block size, target, reward schedule, unit multiplier)
//! and miner settings, loadable from TOML with environment overrides.

pub mod settings;

pub use settings::{
    MinerConfig, ProtocolParams, Settings, CURRENT_PROTOCOL_VERSION, DEFAULT_HASH_LIMIT,
    DEFAULT_TARGET, MAX_MINER_WORKERS, MAX_TRANSACTIONS_IN_BLOCK,
};
