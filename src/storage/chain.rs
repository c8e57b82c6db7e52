// The chain store is the only mutable ledger state: committed blocks, confirmed
// transactions, the pending pool and the address -> unspent output index.
// It does not validate anything. Consensus checks a transaction or a block
// first, then hands it here to be committed.
//
// Blocks and transactions are shared behind Arc, and so are the per-address
// UTXO sets, so a snapshot only bumps reference counts. A snapshot copies a map
// or a set the first time it mutates it (Arc::make_mut).

use crate::core::types::{Address, Hash};
use crate::core::{Block, Transaction, TransactionOutputPointer};
use crate::error::{BlockchainError, Result};
use crate::storage::MemoryPool;
use log::{debug, error, info};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Arc<HashMap<Hash, Arc<Block>>>,
    transactions: Arc<HashMap<Hash, Arc<Transaction>>>,
    last_block_hash: Hash,
    pending_transactions: MemoryPool,
    unspent_outputs: HashMap<Address, Arc<BTreeSet<TransactionOutputPointer>>>,
}

impl Chain {
    /// Start a chain from its genesis block, committing the genesis coinbase.
    pub fn new(genesis: Block) -> Result<Chain> {
        let mut chain = Chain {
            blocks: Arc::new(HashMap::new()),
            transactions: Arc::new(HashMap::new()),
            last_block_hash: Hash::default(),
            pending_transactions: MemoryPool::new(),
            unspent_outputs: HashMap::new(),
        };
        chain.add_block(genesis)?;
        Ok(chain)
    }

    /// A copy that can be mutated without touching this chain
    pub fn snapshot(&self) -> Chain {
        self.clone()
    }

    pub fn get_block(&self, hash: &Hash) -> Option<Arc<Block>> {
        self.blocks.get(hash).cloned()
    }

    /// Committed blocks from genesis to the last block
    pub fn get_blocks(&self) -> Vec<Arc<Block>> {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        let mut current = self.blocks.get(&self.last_block_hash);
        while let Some(block) = current {
            blocks.push(Arc::clone(block));
            current = self
                .blocks
                .get(&block.get_header().get_previous_block_hash());
        }
        blocks.reverse();
        blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// ( last block hash, last block number )
    pub fn get_last_block_info(&self) -> (Hash, u64) {
        (self.last_block_hash, self.last_block_number())
    }

    pub fn last_block_hash(&self) -> Hash {
        self.last_block_hash
    }

    pub fn last_block_number(&self) -> u64 {
        (self.blocks.len() as u64).saturating_sub(1)
    }

    pub fn get_transaction(&self, hash: &Hash) -> Option<Arc<Transaction>> {
        self.transactions.get(hash).cloned()
    }

    pub fn contains_transaction(&self, hash: &Hash) -> bool {
        self.transactions.contains_key(hash)
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Up to `limit` pending transactions in arrival order
    pub fn get_pending_transactions(&self, limit: usize) -> Vec<Arc<Transaction>> {
        self.pending_transactions.get_all(limit)
    }

    /// Pending transactions spending at least one output that `address` owns
    /// or owned.
    pub fn get_pending_transactions_by_address(&self, address: &Address) -> Vec<Arc<Transaction>> {
        self.pending_transactions
            .iter()
            .filter(|tx| {
                tx.get_inputs().iter().any(|input| {
                    self.get_output_owner(&input.output_pointer) == Some(*address)
                })
            })
            .cloned()
            .collect()
    }

    pub fn is_pending(&self, hash: &Hash) -> bool {
        self.pending_transactions.contains(hash)
    }

    pub fn pending_count(&self) -> usize {
        self.pending_transactions.len()
    }

    /// Append to the pending pool without validation. Returns false if the
    /// transaction is already pending.
    pub fn add_pending_transaction(&mut self, tx: Transaction) -> bool {
        let hash = tx.hash();
        let added = self.pending_transactions.add(Arc::new(tx));
        if added {
            debug!("Added pending transaction {hash}");
        }
        added
    }

    pub fn remove_pending_transactions<'a>(&mut self, txs: impl IntoIterator<Item = &'a Transaction>) {
        for tx in txs {
            self.pending_transactions.remove(&tx.hash());
        }
    }

    pub fn get_unspent_outputs(&self, address: &Address) -> Vec<TransactionOutputPointer> {
        self.unspent_outputs
            .get(address)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_unspent(&self, address: &Address, pointer: &TransactionOutputPointer) -> bool {
        self.unspent_outputs
            .get(address)
            .is_some_and(|set| set.contains(pointer))
    }

    /// Amount of the output `pointer` names, spent or not
    pub fn get_output_amount(&self, pointer: &TransactionOutputPointer) -> Option<u64> {
        self.transactions
            .get(&pointer.transaction_hash)?
            .get_output(pointer.output_index)
            .map(|output| output.amount)
    }

    pub fn get_output_owner(&self, pointer: &TransactionOutputPointer) -> Option<Address> {
        self.transactions
            .get(&pointer.transaction_hash)?
            .get_output(pointer.output_index)
            .map(|output| output.receiver_address)
    }

    pub fn get_account_value(&self, address: &Address) -> u64 {
        self.unspent_outputs
            .get(address)
            .map(|set| {
                set.iter()
                    .filter_map(|pointer| self.get_output_amount(pointer))
                    .fold(0u64, u64::saturating_add)
            })
            .unwrap_or(0)
    }

    /// Every address holding at least one unspent output, with its balance
    pub fn get_balances(&self) -> Vec<(Address, u64)> {
        let mut balances: Vec<(Address, u64)> = self
            .unspent_outputs
            .keys()
            .map(|address| (*address, self.get_account_value(address)))
            .collect();
        balances.sort();
        balances
    }

    /// Input total minus output total, or `None` if an input is unknown or the
    /// outputs exceed the inputs.
    pub fn get_pending_transaction_fee(&self, tx: &Transaction) -> Option<u64> {
        let mut input_total = 0u64;
        for input in tx.get_inputs() {
            input_total = input_total.checked_add(self.get_output_amount(&input.output_pointer)?)?;
        }
        let output_total = tx.get_output_value().ok()?;
        input_total.checked_sub(output_total)
    }

    /// Confirm a transaction: drop it from the pending pool, record it, mark
    /// its inputs spent and index its outputs. Nothing changes on error.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        let hash = tx.hash();
        let spent = self.plan_spends(&hash, &tx)?;

        self.pending_transactions.remove(&hash);
        for (owner, pointer) in spent {
            if let Some(set) = self.unspent_outputs.get_mut(&owner) {
                Arc::make_mut(set).remove(&pointer);
                if set.is_empty() {
                    self.unspent_outputs.remove(&owner);
                }
            }
        }
        for (pointer, output) in tx.output_pointers().zip(tx.get_outputs()) {
            let set = self
                .unspent_outputs
                .entry(output.receiver_address)
                .or_default();
            Arc::make_mut(set).insert(pointer);
        }
        Arc::make_mut(&mut self.transactions).insert(hash, Arc::new(tx));
        Ok(())
    }

    /// Resolve every input to the address that owns it, failing if anything
    /// the commit relies on is missing.
    fn plan_spends(
        &self,
        hash: &Hash,
        tx: &Transaction,
    ) -> Result<Vec<(Address, TransactionOutputPointer)>> {
        if self.transactions.contains_key(hash) {
            return Err(self.consistency(format!("Transaction {hash} is already confirmed")));
        }
        if tx.get_outputs().len() > usize::from(u16::MAX) + 1 {
            return Err(self.consistency(format!("Transaction {hash} has too many outputs")));
        }

        let mut seen = HashSet::new();
        let mut spent = Vec::with_capacity(tx.get_inputs().len());
        for input in tx.get_inputs() {
            let pointer = input.output_pointer;
            if !seen.insert(pointer) {
                return Err(self.consistency(format!(
                    "Transaction {hash} spends {}:{} twice",
                    pointer.transaction_hash, pointer.output_index
                )));
            }
            let owner = self.get_output_owner(&pointer).ok_or_else(|| {
                self.consistency(format!(
                    "Transaction {hash} spends unknown output {}:{}",
                    pointer.transaction_hash, pointer.output_index
                ))
            })?;
            if !self.is_unspent(&owner, &pointer) {
                return Err(self.consistency(format!(
                    "Transaction {hash} spends already spent output {}:{}",
                    pointer.transaction_hash, pointer.output_index
                )));
            }
            spent.push((owner, pointer));
        }
        Ok(spent)
    }

    /// Commit an already validated block: body transactions, then the coinbase,
    /// then the block itself. Either all of it lands or none of it does.
    pub fn add_block(&mut self, block: Block) -> Result<()> {
        let block_hash = block.hash();
        if self.blocks.contains_key(&block_hash) {
            return Err(self.consistency(format!("Block {block_hash} is already committed")));
        }

        let mut next = self.snapshot();
        for tx in block.transactions() {
            next.add_transaction(tx.clone())?;
        }
        Arc::make_mut(&mut next.blocks).insert(block_hash, Arc::new(block));
        next.last_block_hash = block_hash;
        next.evict_unspendable_pending();

        *self = next;
        info!(
            "Committed block {} at height {}",
            block_hash,
            self.last_block_number()
        );
        Ok(())
    }

    // Pending transactions whose inputs were spent by a committed block can
    // never be confirmed.
    fn evict_unspendable_pending(&mut self) {
        let before = self.pending_transactions.len();
        let transactions = &self.transactions;
        let unspent_outputs = &self.unspent_outputs;
        self.pending_transactions.retain(|tx| {
            tx.get_inputs().iter().all(|input| {
                let pointer = &input.output_pointer;
                transactions
                    .get(&pointer.transaction_hash)
                    .and_then(|owner_tx| owner_tx.get_output(pointer.output_index))
                    .and_then(|output| unspent_outputs.get(&output.receiver_address))
                    .is_some_and(|set| set.contains(pointer))
            })
        });
        let evicted = before - self.pending_transactions.len();
        if evicted > 0 {
            info!("Evicted {evicted} pending transaction(s) with spent inputs");
        }
    }

    fn consistency(&self, message: String) -> BlockchainError {
        error!("{message}");
        BlockchainError::Consistency(message)
    }
}
