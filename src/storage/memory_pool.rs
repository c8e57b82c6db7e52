use crate::core::types::Hash;
use crate::core::Transaction;
use std::collections::HashSet;
use std::sync::Arc;

/// Pending transactions in arrival order ( hash, Transaction ), no duplicates
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    entries: Vec<(Hash, Arc<Transaction>)>,
    index: HashSet<Hash>,
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool::default()
    }

    /// Append `tx` unless a transaction with the same hash is already pending.
    pub fn add(&mut self, tx: Arc<Transaction>) -> bool {
        let hash = tx.hash();
        if !self.index.insert(hash) {
            return false;
        }
        self.entries.push((hash, tx));
        true
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.index.contains(hash)
    }

    /// Remove by hash; removing an absent transaction is a no-op.
    pub fn remove(&mut self, hash: &Hash) -> bool {
        if !self.index.remove(hash) {
            return false;
        }
        self.entries.retain(|(h, _)| h != hash);
        true
    }

    /// Keep only the transactions for which `keep` returns true, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&Transaction) -> bool) {
        let index = &mut self.index;
        self.entries.retain(|(hash, tx)| {
            let kept = keep(tx);
            if !kept {
                index.remove(hash);
            }
            kept
        });
    }

    /// Up to `limit` pending transactions in arrival order
    pub fn get_all(&self, limit: usize) -> Vec<Arc<Transaction>> {
        self.entries
            .iter()
            .take(limit)
            .map(|(_, tx)| Arc::clone(tx))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Transaction>> {
        self.entries.iter().map(|(_, tx)| tx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
