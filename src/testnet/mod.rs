//! Shared fixtures for unit tests: easy protocol parameters, funded chains,
//! signed transfers and nonce helpers.

pub mod test_utils;

pub use test_utils::*;
