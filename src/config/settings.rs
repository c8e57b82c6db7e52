use crate::core::monetary::{INITIAL_BLOCK_REWARD, UNIT_MULTIPLIER};
use crate::core::types::Target;
use crate::error::{BlockchainError, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

const HASH_LIMIT_KEY: &str = "TESTCOIN_HASH_LIMIT";
const MINER_WORKERS_KEY: &str = "TESTCOIN_MINER_WORKERS";

pub const CURRENT_PROTOCOL_VERSION: u16 = 1;
pub const MAX_TRANSACTIONS_IN_BLOCK: usize = 10;
pub const DEFAULT_TARGET: Target = Target([0x00, 0x0F, 0xFF, 0xFF]);
pub const HALVING_INTERVAL: u64 = 210_000;
/// The maximum number of hashes a miner attempts before giving up on a block
pub const DEFAULT_HASH_LIMIT: u64 = 10_000_000;
pub const MAX_MINER_WORKERS: usize = 256;

/// Consensus-relevant protocol parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    pub protocol_version: u16,
    pub max_transactions_per_block: usize,
    pub target: Target,
    pub initial_block_reward: u64,
    pub halving_interval: u64,
    pub unit_multiplier: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        ProtocolParams {
            protocol_version: CURRENT_PROTOCOL_VERSION,
            max_transactions_per_block: MAX_TRANSACTIONS_IN_BLOCK,
            target: DEFAULT_TARGET,
            initial_block_reward: INITIAL_BLOCK_REWARD,
            halving_interval: HALVING_INTERVAL,
            unit_multiplier: UNIT_MULTIPLIER,
        }
    }
}

impl ProtocolParams {
    /// Target a block at `block_number` must be solved against. Constant for
    /// now; the block number is part of the signature so a schedule can be
    /// introduced without touching callers.
    pub fn compute_target(&self, _block_number: u64) -> Target {
        self.target
    }

    /// Reward minted by the coinbase of block `block_number`, halving every
    /// `halving_interval` blocks.
    pub fn compute_block_reward(&self, block_number: u64) -> u64 {
        let halvings = block_number / self.halving_interval;
        if halvings >= u64::from(u64::BITS) {
            return 0;
        }
        self.initial_block_reward >> halvings
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_transactions_per_block == 0 {
            return Err(BlockchainError::Config(
                "max_transactions_per_block must be positive".to_string(),
            ));
        }
        if self.halving_interval == 0 {
            return Err(BlockchainError::Config(
                "halving_interval must be positive".to_string(),
            ));
        }
        if self.unit_multiplier == 0 {
            return Err(BlockchainError::Config(
                "unit_multiplier must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// How hard and how wide the miner searches for a nonce
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    pub hash_limit: u64,
    pub workers: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            hash_limit: DEFAULT_HASH_LIMIT,
            workers: 1,
        }
    }
}

/// Everything a node needs to start: protocol parameters and miner settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub protocol: ProtocolParams,
    pub miner: MinerConfig,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Settings> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Override miner settings from `TESTCOIN_HASH_LIMIT` and
    /// `TESTCOIN_MINER_WORKERS` when they are set.
    pub fn apply_env(mut self) -> Result<Settings> {
        if let Ok(limit) = env::var(HASH_LIMIT_KEY) {
            self.miner.hash_limit = limit.parse().map_err(|e| {
                BlockchainError::Config(format!("Invalid {HASH_LIMIT_KEY} '{limit}': {e}"))
            })?;
        }
        if let Ok(workers) = env::var(MINER_WORKERS_KEY) {
            self.miner.workers = workers.parse().map_err(|e| {
                BlockchainError::Config(format!("Invalid {MINER_WORKERS_KEY} '{workers}': {e}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.protocol.validate()?;
        if self.miner.workers == 0 || self.miner.workers > MAX_MINER_WORKERS {
            return Err(BlockchainError::Config(format!(
                "miner workers must be between 1 and {MAX_MINER_WORKERS}, got {}",
                self.miner.workers
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.protocol.protocol_version, CURRENT_PROTOCOL_VERSION);
        assert_eq!(settings.miner.hash_limit, DEFAULT_HASH_LIMIT);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_block_reward_halves() {
        let params = ProtocolParams {
            initial_block_reward: 100,
            halving_interval: 10,
            ..ProtocolParams::default()
        };
        assert_eq!(params.compute_block_reward(0), 100);
        assert_eq!(params.compute_block_reward(9), 100);
        assert_eq!(params.compute_block_reward(10), 50);
        assert_eq!(params.compute_block_reward(25), 25);
        assert_eq!(params.compute_block_reward(10 * 64), 0);
        assert_eq!(params.compute_block_reward(u64::MAX), 0);
    }

    #[test]
    fn test_target_is_constant() {
        let params = ProtocolParams::default();
        assert_eq!(params.compute_target(0), DEFAULT_TARGET);
        assert_eq!(params.compute_target(1_000), DEFAULT_TARGET);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [protocol]
            max_transactions_per_block = 2
            target = [255, 255, 255, 255]

            [miner]
            hash_limit = 500
            "#,
        )
        .unwrap();
        assert_eq!(settings.protocol.max_transactions_per_block, 2);
        assert_eq!(settings.protocol.target, Target([0xFF; 4]));
        assert_eq!(settings.protocol.unit_multiplier, UNIT_MULTIPLIER);
        assert_eq!(settings.miner.hash_limit, 500);
        assert_eq!(settings.miner.workers, 1);
    }

    #[test]
    fn test_invalid_toml_values() {
        let result = Settings::from_toml_str("[protocol]\nhalving_interval = 0\n");
        assert!(matches!(result, Err(BlockchainError::Config(_))));

        let result = Settings::from_toml_str("[miner]\nworkers = 0\n");
        assert!(matches!(result, Err(BlockchainError::Config(_))));

        let result = Settings::from_toml_str("[miner]\nworkers = 100000\n");
        assert!(matches!(result, Err(BlockchainError::Config(_))));

        let result = Settings::from_toml_str("[protocol\n");
        assert!(matches!(result, Err(BlockchainError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[miner]\nworkers = 3").unwrap();
        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.miner.workers, 3);

        let missing = Settings::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(BlockchainError::Io(_))));
    }
}
