//! Error handling for the ledger
//!
//! One error type covers every fallible operation in the crate. Validation
//! rejections are reported as `bool` by the consensus engine; the
//! `InvalidTransaction` and `InvalidBlock` variants carry the reason when a
//! caller wants it (logging, the node façade).

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Key generation, signing or key decoding failed
    Crypto(String),
    /// Malformed byte buffer during decode
    Serialization(String),
    /// Invalid or unreadable configuration
    Config(String),
    /// A transaction was rejected by validation
    InvalidTransaction(String),
    /// A block was rejected by validation
    InvalidBlock(String),
    /// The chain store was asked to commit something that does not exist.
    /// Indicates a caller skipped validation.
    Consistency(String),
    /// Nonce search failed or was cancelled
    Mining(String),
    /// Insufficient funds to build a transaction
    InsufficientFunds { required: u64, available: u64 },
    /// File I/O errors
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::Consistency(msg) => write!(f, "Chain consistency error: {msg}"),
            BlockchainError::Mining(msg) => write!(f, "Mining error: {msg}"),
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for BlockchainError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}
