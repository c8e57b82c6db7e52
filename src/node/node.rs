use crate::config::{MinerConfig, ProtocolParams, Settings};
use crate::core::monetary::conversions::{coins_to_units, units_to_coins};
use crate::core::types::Address;
use crate::core::{
    Block, Consensus, Miner, ProofOfWork, Transaction, TransactionInput, TransactionOutput,
    TransactionOutputPointer,
};
use crate::error::{BlockchainError, Result};
use crate::node::ChainSummary;
use crate::storage::Chain;
use crate::wallet::Account;
use log::{error, info};
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A single node: the chain, the rules it is validated by and an optional miner
pub struct Node {
    params: ProtocolParams,
    miner_config: MinerConfig,
    chain: RwLock<Chain>,
    consensus: Arc<dyn Consensus + Send + Sync>,
    miner: Option<Miner>,
}

impl Node {
    /// A proof-of-work node whose genesis reward goes to `genesis_address`
    pub fn new(settings: Settings, genesis_address: Address) -> Result<Node> {
        let consensus = Arc::new(ProofOfWork::new(settings.protocol.clone()));
        Self::with_consensus(settings, genesis_address, consensus)
    }

    pub fn with_consensus(
        settings: Settings,
        genesis_address: Address,
        consensus: Arc<dyn Consensus + Send + Sync>,
    ) -> Result<Node> {
        settings.validate()?;
        let genesis = Block::genesis(&settings.protocol, genesis_address);
        info!("Creating chain with genesis block {}", genesis.hash());
        let chain = Chain::new(genesis)?;
        Ok(Node {
            params: settings.protocol,
            miner_config: settings.miner,
            chain: RwLock::new(chain),
            consensus,
            miner: None,
        })
    }

    pub fn get_params(&self) -> &ProtocolParams {
        &self.params
    }

    fn read_chain(&self) -> Result<RwLockReadGuard<'_, Chain>> {
        self.chain.read().map_err(|_| {
            error!("Failed to acquire read lock on chain");
            BlockchainError::Consistency("chain lock poisoned".to_string())
        })
    }

    fn write_chain(&self) -> Result<RwLockWriteGuard<'_, Chain>> {
        self.chain.write().map_err(|_| {
            error!("Failed to acquire write lock on chain");
            BlockchainError::Consistency("chain lock poisoned".to_string())
        })
    }

    /// A copy of the current chain state
    pub fn chain_snapshot(&self) -> Result<Chain> {
        Ok(self.read_chain()?.snapshot())
    }

    /// Validate `tx` and add it to the pending pool. `false` if it is invalid
    /// or already pending.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<bool> {
        let mut chain = self.write_chain()?;
        if !self.consensus.validate_pending_transaction(&chain, &tx) {
            return Ok(false);
        }
        let hash = tx.hash();
        let added = chain.add_pending_transaction(tx);
        if added {
            info!("Accepted pending transaction {hash}");
        }
        Ok(added)
    }

    /// Build, sign and submit a payment of `amount` to `receiver` leaving
    /// `fee` unclaimed. Outputs not already spent by a pending transaction are
    /// used first. Any excess comes back to the sender as change.
    pub fn new_peer_transaction(
        &self,
        sender: &Account,
        receiver: Address,
        amount: u64,
        fee: u64,
    ) -> Result<Transaction> {
        let required = amount.checked_add(fee).ok_or_else(|| {
            BlockchainError::InvalidTransaction("amount plus fee overflows".to_string())
        })?;
        let sender_address = sender.get_address();

        let (selected, selected_total) = {
            let chain = self.read_chain()?;
            let pending_spent: HashSet<TransactionOutputPointer> = chain
                .get_pending_transactions_by_address(&sender_address)
                .iter()
                .flat_map(|tx| tx.get_inputs().iter().map(|input| input.output_pointer))
                .collect();
            let (free, in_flight): (Vec<_>, Vec<_>) = chain
                .get_unspent_outputs(&sender_address)
                .into_iter()
                .partition(|pointer| !pending_spent.contains(pointer));

            let mut selected = Vec::new();
            let mut selected_total = 0u64;
            let mut available = 0u64;
            for pointer in free.into_iter().chain(in_flight) {
                let value = chain.get_output_amount(&pointer).unwrap_or(0);
                available = available.saturating_add(value);
                if selected_total < required {
                    selected_total = selected_total.saturating_add(value);
                    selected.push(pointer);
                }
            }
            if selected_total < required {
                return Err(BlockchainError::InsufficientFunds {
                    required,
                    available,
                });
            }
            (selected, selected_total)
        };

        let mut inputs = Vec::with_capacity(selected.len());
        for pointer in selected {
            let signature = self.consensus.sign_input(sender.get_private_key(), &pointer)?;
            inputs.push(TransactionInput::new(
                pointer,
                signature,
                sender.get_public_key().to_vec(),
            ));
        }

        let mut outputs = vec![TransactionOutput::new(receiver, amount)];
        let change = selected_total - required;
        if change > 0 {
            outputs.push(TransactionOutput::new(sender_address, change));
        }

        let tx = Transaction::new(self.params.protocol_version, inputs, outputs);
        if !self.submit_transaction(tx.clone())? {
            return Err(BlockchainError::InvalidTransaction(format!(
                "{} was rejected",
                tx.hash()
            )));
        }
        Ok(tx)
    }

    /// `new_peer_transaction` with coin amounts converted to units
    pub fn new_readable_peer_transaction(
        &self,
        sender: &Account,
        receiver: Address,
        amount: f64,
        fee: f64,
    ) -> Result<Transaction> {
        let multiplier = self.params.unit_multiplier;
        self.new_peer_transaction(
            sender,
            receiver,
            coins_to_units(amount, multiplier),
            coins_to_units(fee, multiplier),
        )
    }

    /// Mine future blocks with rewards paid to `coinbase_address`.
    pub fn start_miner(&mut self, coinbase_address: Address) {
        info!("Starting miner for {coinbase_address}");
        self.miner = Some(Miner::new(
            self.params.clone(),
            coinbase_address,
            self.miner_config.clone(),
        ));
    }

    /// Stop a nonce search in progress
    pub fn cancel_mining(&self) {
        if let Some(miner) = &self.miner {
            miner
                .cancel_handle()
                .store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    /// Mine one block on a snapshot, then validate and commit it. `Ok(None)`
    /// when the search gave up.
    pub fn mine_block(&self) -> Result<Option<Block>> {
        let miner = self
            .miner
            .as_ref()
            .ok_or_else(|| BlockchainError::Mining("miner has not been started".to_string()))?;

        let snapshot = self.chain_snapshot()?;
        let Some(block) = miner.mine_block(&snapshot, self.consensus.as_ref()) else {
            return Ok(None);
        };

        let mut chain = self.write_chain()?;
        if !self.consensus.validate_block(&chain, &block) {
            return Err(BlockchainError::InvalidBlock(format!(
                "mined block {} does not extend the chain",
                block.hash()
            )));
        }
        chain.add_block(block.clone())?;
        Ok(Some(block))
    }

    pub fn get_account_value(&self, address: &Address) -> Result<u64> {
        Ok(self.read_chain()?.get_account_value(address))
    }

    pub fn get_readable_account_value(&self, address: &Address) -> Result<f64> {
        Ok(units_to_coins(
            self.get_account_value(address)?,
            self.params.unit_multiplier,
        ))
    }

    pub fn chain_summary(&self) -> Result<ChainSummary> {
        Ok(ChainSummary::from_chain(
            &*self.read_chain()?,
            self.params.unit_multiplier,
        ))
    }
}
