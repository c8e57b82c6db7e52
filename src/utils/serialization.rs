// Canonical wire encoding shared by hashing, signing and round-tripping.
// Big-endian, fixed-width integers; lengths and counts are u64; fixed-size
// arrays are written raw. Changing this configuration changes every hash.
use crate::error::{BlockchainError, Result};
use bincode::config::{self, Config};
use bincode::{Decode, Encode};

/// Upper bound on the size of a single decoded value
pub const MAX_DECODE_SIZE: usize = 4 * 1024 * 1024;

fn encode_config() -> impl Config {
    config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

fn decode_config() -> impl Config {
    config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
        .with_limit::<MAX_DECODE_SIZE>()
}

/// Encode a value into its canonical bytes.
pub fn encode<T: Encode>(data: &T) -> Vec<u8> {
    // Writing into a Vec has no failure path for the ledger types.
    bincode::encode_to_vec(data, encode_config())
        .expect("canonical encoding into a Vec cannot fail")
}

/// Decode a value from its canonical bytes. The whole buffer must be consumed.
pub fn decode<T: Decode<()>>(bytes: &[u8]) -> Result<T> {
    let (data, read) = bincode::decode_from_slice(bytes, decode_config())
        .map_err(|e| BlockchainError::Serialization(format!("Deserialization failed: {e}")))?;
    if read != bytes.len() {
        return Err(BlockchainError::Serialization(format!(
            "{} trailing bytes after value",
            bytes.len() - read
        )));
    }
    Ok(data)
}
