//! Test utilities for ledger testing

use crate::config::ProtocolParams;
use crate::core::types::{Address, Target};
use crate::core::{
    Block, Consensus, ProofOfWork, Transaction, TransactionInput, TransactionOutput,
    GENESIS_PREVIOUS_HASH,
};
use crate::storage::Chain;
use crate::wallet::Account;
use std::collections::HashSet;

/// Roughly every other hash meets this target
pub const EASY_TARGET: Target = Target([0x7F, 0xFF, 0xFF, 0xFF]);

/// Default protocol parameters with an easy target for fast tests
pub fn easy_params() -> ProtocolParams {
    ProtocolParams {
        target: EASY_TARGET,
        ..ProtocolParams::default()
    }
}

/// An engine, a chain whose genesis reward belongs to the returned account,
/// and that account
pub fn funded_chain() -> (ProofOfWork, Chain, Account) {
    let params = easy_params();
    let account = Account::new().expect("account creation should succeed");
    let chain = Chain::new(Block::genesis(&params, account.get_address()))
        .expect("genesis commit should succeed");
    (ProofOfWork::new(params), chain, account)
}

/// A transaction spending every unspent output of `sender`, signed by it
pub fn signed_transfer(
    engine: &ProofOfWork,
    chain: &Chain,
    sender: &Account,
    outputs: Vec<(Address, u64)>,
) -> Transaction {
    let inputs = chain
        .get_unspent_outputs(&sender.get_address())
        .into_iter()
        .map(|pointer| {
            let signature = engine
                .sign_input(sender.get_private_key(), &pointer)
                .expect("signing should succeed");
            TransactionInput::new(pointer, signature, sender.get_public_key().to_vec())
        })
        .collect();
    let outputs = outputs
        .into_iter()
        .map(|(address, amount)| TransactionOutput::new(address, amount))
        .collect();
    Transaction::new(engine.get_params().protocol_version, inputs, outputs)
}

/// The block with the first nonce (counting from zero) whose header meets the
/// target if `meets` is true, or fails it if `meets` is false
pub fn find_nonce(block: Block, meets: bool) -> Block {
    let nonce = (0..=u32::MAX)
        .find(|nonce| block.get_header().with_nonce(*nonce).meets_target() == meets)
        .expect("a matching nonce should exist");
    block.with_nonce(nonce)
}

/// Check linkage and proof of work of every block after genesis, and that
/// every unspent output resolves to a confirmed output of the address it is
/// listed under, with no pointer listed twice
pub fn validate_chain_integrity(chain: &Chain) -> bool {
    let mut listed = HashSet::new();
    for (address, _) in chain.get_balances() {
        for pointer in chain.get_unspent_outputs(&address) {
            if !chain.contains_transaction(&pointer.transaction_hash)
                || chain.get_output_owner(&pointer) != Some(address)
                || !listed.insert(pointer)
            {
                return false;
            }
        }
    }

    let blocks = chain.get_blocks();
    let mut previous = *GENESIS_PREVIOUS_HASH;
    for (number, block) in blocks.iter().enumerate() {
        let header = block.get_header();
        if header.get_previous_block_hash() != previous {
            return false;
        }
        if number > 0 && !header.meets_target() {
            return false;
        }
        previous = block.hash();
    }
    blocks.len() == chain.block_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funded_chain() {
        let (engine, chain, account) = funded_chain();
        assert_eq!(
            chain.get_account_value(&account.get_address()),
            engine.get_params().compute_block_reward(0)
        );
        assert!(validate_chain_integrity(&chain));
    }

    #[test]
    fn test_signed_transfer_is_valid() {
        let (engine, chain, account) = funded_chain();
        let tx = signed_transfer(&engine, &chain, &account, vec![(Address([1u8; 32]), 1)]);
        assert_eq!(tx.get_inputs().len(), 1);
        assert!(engine.validate_pending_transaction(&chain, &tx));
    }

    #[test]
    fn test_integrity_holds_over_several_blocks() {
        use crate::config::MinerConfig;
        use crate::core::Miner;

        let (engine, mut chain, alice) = funded_chain();
        let bob = Account::new().unwrap();
        let miner = Miner::new(
            engine.get_params().clone(),
            bob.get_address(),
            MinerConfig {
                hash_limit: 10_000,
                workers: 1,
            },
        );

        for _ in 0..3 {
            let value = chain.get_account_value(&alice.get_address());
            let tx = signed_transfer(
                &engine,
                &chain,
                &alice,
                vec![(bob.get_address(), 10), (alice.get_address(), value - 11)],
            );
            assert!(chain.add_pending_transaction(tx));

            let block = miner.mine_block(&chain, &engine).unwrap();
            assert!(engine.validate_block(&chain, &block));
            chain.add_block(block).unwrap();
            assert!(validate_chain_integrity(&chain));
        }
        assert_eq!(chain.block_count(), 4);
        assert_eq!(chain.get_unspent_outputs(&bob.get_address()).len(), 6);
    }

    #[test]
    fn test_find_nonce_both_ways() {
        let params = easy_params();
        let block = Block::genesis(&params, Address([1u8; 32]));
        assert!(find_nonce(block.clone(), true).get_header().meets_target());
        assert!(!find_nonce(block, false).get_header().meets_target());
    }
}
