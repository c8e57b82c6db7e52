//! Accounts
//!
//! Key pair generation and address derivation. An address is the SHA-256
//! digest of the encoded public key.

pub mod account;

pub use account::{Account, PrivateKey};
