//! Utility functions and helpers
//!
//! The crypto collaborator (hashing, ECDSA signing and verification, the
//! ledger clock) and the canonical byte codec.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    current_timestamp, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify,
    new_key_pair, sha256_digest, DIGEST_LEN,
};

pub use serialization::{decode, encode, MAX_DECODE_SIZE};
