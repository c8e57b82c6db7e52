use crate::config::ProtocolParams;
use crate::core::types::{Address, Hash, Target};
use crate::core::Transaction;
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, decode, encode};
use bincode::{Decode, Encode};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Previous-block hash recorded in the genesis header
pub static GENESIS_PREVIOUS_HASH: Lazy<Hash> = Lazy::new(|| Hash::digest(b"first"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct BlockHeader {
    protocol_version: u16,
    previous_block_hash: Hash,
    all_transactions_hash: Hash,
    timestamp: i64,
    target: Target,
    nonce: u32,
}

impl BlockHeader {
    pub fn new(
        protocol_version: u16,
        previous_block_hash: Hash,
        all_transactions_hash: Hash,
        timestamp: i64,
        target: Target,
        nonce: u32,
    ) -> BlockHeader {
        BlockHeader {
            protocol_version,
            previous_block_hash,
            all_transactions_hash,
            timestamp,
            target,
            nonce,
        }
    }

    pub fn hash(&self) -> Hash {
        Hash::of(self)
    }

    /// A copy of this header carrying `nonce`
    pub fn with_nonce(&self, nonce: u32) -> BlockHeader {
        BlockHeader {
            nonce,
            ..self.clone()
        }
    }

    /// True iff this header's hash is strictly below its expanded target
    pub fn meets_target(&self) -> bool {
        self.target.is_met_by(&self.hash())
    }

    pub fn get_protocol_version(&self) -> u16 {
        self.protocol_version
    }

    pub fn get_previous_block_hash(&self) -> Hash {
        self.previous_block_hash
    }

    pub fn get_all_transactions_hash(&self) -> Hash {
        self.all_transactions_hash
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_target(&self) -> Target {
        self.target
    }

    pub fn get_nonce(&self) -> u32 {
        self.nonce
    }

    pub fn serialize(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<BlockHeader> {
        decode(bytes)
    }
}

/// A header plus its transactions. The coinbase is kept apart from the body
/// but is hashed into the header and confirmed like any body transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Block {
    header: BlockHeader,
    body: Vec<Transaction>,
    coinbase: Transaction,
}

impl Block {
    /// Assemble an unsolved candidate (nonce 0) for block `block_number`.
    pub fn new(
        params: &ProtocolParams,
        previous_block_hash: Hash,
        block_number: u64,
        body: Vec<Transaction>,
        coinbase: Transaction,
    ) -> Result<Block> {
        if body.len() > params.max_transactions_per_block {
            return Err(BlockchainError::InvalidBlock(format!(
                "{} transactions exceed the maximum of {}",
                body.len(),
                params.max_transactions_per_block
            )));
        }

        let header = BlockHeader::new(
            params.protocol_version,
            previous_block_hash,
            Self::compute_all_transactions_hash(&body, &coinbase),
            current_timestamp(),
            params.compute_target(block_number),
            0,
        );

        Ok(Block {
            header,
            body,
            coinbase,
        })
    }

    /// Block 0: coinbase only, linked to `hash("first")`, not proof-of-work solved.
    pub fn genesis(params: &ProtocolParams, coinbase_address: Address) -> Block {
        let coinbase = Transaction::new_coinbase(
            params.protocol_version,
            coinbase_address,
            params.compute_block_reward(0),
        );
        let header = BlockHeader::new(
            params.protocol_version,
            *GENESIS_PREVIOUS_HASH,
            Self::compute_all_transactions_hash(&[], &coinbase),
            current_timestamp(),
            params.compute_target(0),
            0,
        );
        Block {
            header,
            body: vec![],
            coinbase,
        }
    }

    /// Put a block together from parts as received, without any checks.
    pub fn from_parts(header: BlockHeader, body: Vec<Transaction>, coinbase: Transaction) -> Block {
        Block {
            header,
            body,
            coinbase,
        }
    }

    /// `hash(body[0].hash() ++ … ++ body[n-1].hash() ++ coinbase.hash())`
    pub fn compute_all_transactions_hash(body: &[Transaction], coinbase: &Transaction) -> Hash {
        let mut data_bytes = Vec::with_capacity((body.len() + 1) * 32);
        for tx in body {
            data_bytes.extend(tx.hash().as_bytes());
        }
        data_bytes.extend(coinbase.hash().as_bytes());
        Hash::digest(&data_bytes)
    }

    /// Replace the header nonce, keeping everything else.
    pub fn with_nonce(self, nonce: u32) -> Block {
        Block {
            header: self.header.with_nonce(nonce),
            ..self
        }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn get_body(&self) -> &[Transaction] {
        self.body.as_slice()
    }

    pub fn get_coinbase(&self) -> &Transaction {
        &self.coinbase
    }

    /// Body transactions followed by the coinbase, in confirmation order
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.body.iter().chain(std::iter::once(&self.coinbase))
    }

    pub fn serialize(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        let block: Block = decode(bytes)?;
        for tx in block.transactions() {
            tx.check_output_count()?;
        }
        Ok(block)
    }
}
