use crate::config::{MinerConfig, ProtocolParams};
use crate::core::types::Address;
use crate::core::{Block, BlockHeader, Consensus, Transaction};
use crate::storage::Chain;
use log::{debug, info, warn};
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Assembles blocks from the pending pool and solves them.
///
/// The miner never commits anything; a solved block still has to pass
/// `Consensus::validate_block` before `Chain::add_block`.
#[derive(Debug)]
pub struct Miner {
    params: ProtocolParams,
    coinbase_address: Address,
    config: MinerConfig,
    cancel: Arc<AtomicBool>,
}

impl Miner {
    pub fn new(params: ProtocolParams, coinbase_address: Address, config: MinerConfig) -> Miner {
        Miner {
            params,
            coinbase_address,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Setting the returned flag stops the nonce search in progress, or the
    /// next one if none is running. The flag is cleared when that search ends.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Build and solve the block that would follow `chain`'s last block.
    /// `None` when `hash_limit` attempts are exhausted or the search is cancelled.
    pub fn mine_block<C: Consensus + ?Sized>(&self, chain: &Chain, consensus: &C) -> Option<Block> {
        let (last_hash, last_number) = chain.get_last_block_info();
        let block_number = last_number + 1;
        let body = self.select_transactions(chain, consensus);
        let coinbase = Transaction::new_coinbase(
            self.params.protocol_version,
            self.coinbase_address,
            self.params.compute_block_reward(block_number),
        );

        info!(
            "Mining block {block_number} with {} transaction(s)",
            body.len()
        );
        let candidate = match Block::new(&self.params, last_hash, block_number, body, coinbase) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Could not assemble block {block_number}: {e}");
                return None;
            }
        };
        self.solve(candidate)
    }

    /// Pending transactions ordered by descending fee (arrival order on ties),
    /// keeping each only if it is still valid on top of the ones already chosen.
    pub fn select_transactions<C: Consensus + ?Sized>(
        &self,
        chain: &Chain,
        consensus: &C,
    ) -> Vec<Transaction> {
        let mut candidates: Vec<(u64, Arc<Transaction>)> = chain
            .get_pending_transactions(usize::MAX)
            .into_iter()
            .filter_map(|tx| chain.get_pending_transaction_fee(&tx).map(|fee| (fee, tx)))
            .collect();
        candidates.sort_by_key(|(fee, _)| Reverse(*fee));

        let mut snapshot = chain.snapshot();
        let mut selected = Vec::new();
        for (fee, tx) in candidates {
            if selected.len() >= self.params.max_transactions_per_block {
                break;
            }
            if !consensus.validate_pending_transaction(&snapshot, &tx) {
                debug!("Skipping pending transaction {}", tx.hash());
                continue;
            }
            let tx = Transaction::clone(&tx);
            if snapshot.add_transaction(tx.clone()).is_err() {
                continue;
            }
            debug!("Selected transaction {} with fee {fee}", tx.hash());
            selected.push(tx);
        }
        selected
    }

    /// Search for a nonce that makes `candidate` meet its target, starting at
    /// a random nonce.
    pub fn solve(&self, candidate: Block) -> Option<Block> {
        let start = rand::random::<u32>();
        let header = candidate.get_header().clone();

        let result = search_nonce(
            &header,
            start,
            self.config.hash_limit,
            self.config.workers,
            &self.cancel,
        );
        if self.cancel.swap(false, Ordering::SeqCst) {
            info!("Mining cancelled");
            return None;
        }

        match result {
            Some(nonce) => {
                let block = candidate.with_nonce(nonce);
                info!("Solved block {} with nonce {nonce}", block.hash());
                Some(block)
            }
            None => {
                warn!(
                    "No nonce found for target {} within {} hashes",
                    header.get_target(),
                    self.config.hash_limit
                );
                None
            }
        }
    }
}

/// Try at most `hash_limit` nonces from `start` upwards (wrapping) across
/// `workers` threads. Worker `i` tries `start + i`, `start + i + workers`, ...
/// The first solution, or a raised `cancel` flag, stops every worker.
/// No more threads are spawned than there are nonces to try.
pub fn search_nonce(
    header: &BlockHeader,
    start: u32,
    hash_limit: u64,
    workers: usize,
    cancel: &AtomicBool,
) -> Option<u32> {
    let workers = (workers as u64).clamp(1, hash_limit.max(1));
    if workers == 1 {
        return search_stride(header, start, 0, 1, hash_limit, cancel, None);
    }

    let found = AtomicBool::new(false);
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|offset| {
                let found = &found;
                scope.spawn(move || {
                    search_stride(header, start, offset, workers, hash_limit, cancel, Some(found))
                })
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok().flatten())
            .next()
    })
}

fn search_stride(
    header: &BlockHeader,
    start: u32,
    offset: u64,
    stride: u64,
    hash_limit: u64,
    cancel: &AtomicBool,
    found: Option<&AtomicBool>,
) -> Option<u32> {
    let mut attempt = offset;
    while attempt < hash_limit {
        if cancel.load(Ordering::Relaxed) || found.is_some_and(|f| f.load(Ordering::Relaxed)) {
            return None;
        }
        // truncation is the wrap-around
        let nonce = start.wrapping_add(attempt as u32);
        if header.with_nonce(nonce).meets_target() {
            if let Some(found) = found {
                found.store(true, Ordering::Relaxed);
            }
            return Some(nonce);
        }
        attempt = attempt.saturating_add(stride);
    }
    None
}
