use crate::core::monetary::conversions::units_to_coins;
use crate::core::types::{Address, Hash, Target};
use crate::storage::Chain;
use serde::Serialize;

/// Serializable overview of a chain: its blocks in order and every balance
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    pub last_block_hash: Hash,
    pub block_count: usize,
    pub transaction_count: usize,
    pub pending_count: usize,
    pub blocks: Vec<BlockSummary>,
    pub balances: Vec<BalanceSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub number: u64,
    pub hash: Hash,
    pub previous_block_hash: Hash,
    pub timestamp: i64,
    pub target: Target,
    pub nonce: u32,
    pub coinbase: Hash,
    pub transactions: Vec<Hash>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceSummary {
    pub address: Address,
    pub units: u64,
    pub coins: f64,
}

impl ChainSummary {
    pub fn from_chain(chain: &Chain, unit_multiplier: u64) -> ChainSummary {
        let blocks = chain
            .get_blocks()
            .iter()
            .enumerate()
            .map(|(number, block)| {
                let header = block.get_header();
                BlockSummary {
                    number: number as u64,
                    hash: block.hash(),
                    previous_block_hash: header.get_previous_block_hash(),
                    timestamp: header.get_timestamp(),
                    target: header.get_target(),
                    nonce: header.get_nonce(),
                    coinbase: block.get_coinbase().hash(),
                    transactions: block.get_body().iter().map(|tx| tx.hash()).collect(),
                }
            })
            .collect();

        let balances = chain
            .get_balances()
            .into_iter()
            .map(|(address, units)| BalanceSummary {
                address,
                units,
                coins: units_to_coins(units, unit_multiplier),
            })
            .collect();

        ChainSummary {
            last_block_hash: chain.last_block_hash(),
            block_count: chain.block_count(),
            transaction_count: chain.transaction_count(),
            pending_count: chain.pending_count(),
            blocks,
            balances,
        }
    }
}
