// Proof-of-work rule set. Each check is written as a Result so the reason for
// a rejection can be logged or returned by the node; the Consensus methods
// collapse them to a bool.

use crate::config::ProtocolParams;
use crate::core::types::Signature;
use crate::core::{Block, Consensus, Transaction, TransactionOutputPointer};
use crate::error::{BlockchainError, Result};
use crate::storage::Chain;
use crate::utils::{ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify};
use crate::wallet::PrivateKey;
use log::warn;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ProofOfWork {
    params: ProtocolParams,
}

impl ProofOfWork {
    pub fn new(params: ProtocolParams) -> ProofOfWork {
        ProofOfWork { params }
    }

    pub fn get_params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Validate `tx` against `chain`, returning its fee.
    pub fn check_pending_transaction(&self, chain: &Chain, tx: &Transaction) -> Result<u64> {
        let tx_hash = tx.hash();
        if tx.is_coinbase() {
            return Err(BlockchainError::InvalidTransaction(format!(
                "{tx_hash} has no inputs"
            )));
        }

        let mut seen = HashSet::new();
        let mut input_total = 0u64;
        for input in tx.get_inputs() {
            let pointer = &input.output_pointer;
            if !seen.insert(pointer.hash()) {
                return Err(BlockchainError::InvalidTransaction(format!(
                    "{tx_hash} spends {}:{} twice",
                    pointer.transaction_hash, pointer.output_index
                )));
            }

            let verification = &input.verification;
            if !self.verify_input(
                &verification.encoded_public_key,
                pointer,
                &verification.signature,
            ) {
                return Err(BlockchainError::InvalidTransaction(format!(
                    "{tx_hash} has a bad signature for {}:{}",
                    pointer.transaction_hash, pointer.output_index
                )));
            }

            // Ownership and unspentness in one lookup
            let sender = input.sender_address();
            if !chain.is_unspent(&sender, pointer) {
                return Err(BlockchainError::InvalidTransaction(format!(
                    "{tx_hash} spends {}:{} which is not an unspent output of {sender}",
                    pointer.transaction_hash, pointer.output_index
                )));
            }

            let amount = chain.get_output_amount(pointer).ok_or_else(|| {
                BlockchainError::InvalidTransaction(format!(
                    "{tx_hash} spends unknown output {}:{}",
                    pointer.transaction_hash, pointer.output_index
                ))
            })?;
            input_total = input_total.checked_add(amount).ok_or_else(|| {
                BlockchainError::InvalidTransaction(format!("{tx_hash} input value overflow"))
            })?;
        }

        let output_total = tx.get_output_value()?;
        input_total.checked_sub(output_total).ok_or_else(|| {
            BlockchainError::InvalidTransaction(format!(
                "{tx_hash} spends {output_total} but only has {input_total}"
            ))
        })
    }

    pub fn check_coinbase_transaction(&self, chain: &Chain, coinbase: &Transaction) -> Result<()> {
        if !coinbase.is_coinbase() {
            return Err(BlockchainError::InvalidTransaction(
                "coinbase must not have inputs".to_string(),
            ));
        }
        let outputs = coinbase.get_outputs();
        if outputs.len() != 1 {
            return Err(BlockchainError::InvalidTransaction(format!(
                "coinbase must have exactly one output, found {}",
                outputs.len()
            )));
        }

        let block_number = chain.last_block_number() + 1;
        let reward = self.params.compute_block_reward(block_number);
        if outputs[0].amount != reward {
            return Err(BlockchainError::InvalidTransaction(format!(
                "coinbase pays {} but the reward for block {block_number} is {reward}",
                outputs[0].amount
            )));
        }
        Ok(())
    }

    pub fn check_block(&self, chain: &Chain, block: &Block) -> Result<()> {
        let header = block.get_header();
        let (last_hash, last_number) = chain.get_last_block_info();
        let block_number = last_number + 1;

        if header.get_protocol_version() != self.params.protocol_version {
            return Err(BlockchainError::InvalidBlock(format!(
                "protocol version {} is not {}",
                header.get_protocol_version(),
                self.params.protocol_version
            )));
        }
        if header.get_previous_block_hash() != last_hash {
            return Err(BlockchainError::InvalidBlock(format!(
                "previous block {} is not the last block {last_hash}",
                header.get_previous_block_hash()
            )));
        }
        if block.get_body().len() > self.params.max_transactions_per_block {
            return Err(BlockchainError::InvalidBlock(format!(
                "{} transactions exceed the maximum of {}",
                block.get_body().len(),
                self.params.max_transactions_per_block
            )));
        }

        self.check_coinbase_transaction(chain, block.get_coinbase())
            .map_err(|e| BlockchainError::InvalidBlock(e.to_string()))?;
        if chain.contains_transaction(&block.get_coinbase().hash()) {
            return Err(BlockchainError::InvalidBlock(
                "coinbase is already confirmed".to_string(),
            ));
        }

        // Commit each transaction into a snapshot before checking the next, so
        // two transactions in one block cannot spend the same output.
        let mut snapshot = chain.snapshot();
        for tx in block.get_body() {
            self.check_pending_transaction(&snapshot, tx)
                .map_err(|e| BlockchainError::InvalidBlock(e.to_string()))?;
            snapshot
                .add_transaction(tx.clone())
                .map_err(|e| BlockchainError::InvalidBlock(e.to_string()))?;
        }

        let all_transactions_hash =
            Block::compute_all_transactions_hash(block.get_body(), block.get_coinbase());
        if header.get_all_transactions_hash() != all_transactions_hash {
            return Err(BlockchainError::InvalidBlock(format!(
                "transactions hash {} does not match the body {all_transactions_hash}",
                header.get_all_transactions_hash()
            )));
        }

        let expected_target = self.params.compute_target(block_number);
        if header.get_target() != expected_target {
            return Err(BlockchainError::InvalidBlock(format!(
                "target {} is not {expected_target}",
                header.get_target()
            )));
        }
        if !header.meets_target() {
            return Err(BlockchainError::InvalidBlock(format!(
                "hash {} does not meet target {}",
                header.hash(),
                header.get_target()
            )));
        }
        Ok(())
    }
}

impl Consensus for ProofOfWork {
    fn sign_input(
        &self,
        private_key: &PrivateKey,
        pointer: &TransactionOutputPointer,
    ) -> Result<Signature> {
        ecdsa_p256_sha256_sign_digest(private_key.as_bytes(), &pointer.signing_bytes())
            .map(Signature)
    }

    fn verify_input(
        &self,
        public_key: &[u8],
        pointer: &TransactionOutputPointer,
        signature: &Signature,
    ) -> bool {
        ecdsa_p256_sha256_sign_verify(public_key, signature.as_bytes(), &pointer.signing_bytes())
    }

    fn validate_pending_transaction(&self, chain: &Chain, tx: &Transaction) -> bool {
        match self.check_pending_transaction(chain, tx) {
            Ok(_) => true,
            Err(e) => {
                warn!("Rejected transaction: {e}");
                false
            }
        }
    }

    fn validate_coinbase_transaction(&self, chain: &Chain, coinbase: &Transaction) -> bool {
        match self.check_coinbase_transaction(chain, coinbase) {
            Ok(()) => true,
            Err(e) => {
                warn!("Rejected coinbase: {e}");
                false
            }
        }
    }

    fn validate_block(&self, chain: &Chain, block: &Block) -> bool {
        match self.check_block(chain, block) {
            Ok(()) => true,
            Err(e) => {
                warn!("Rejected block {}: {e}", block.hash());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Address, Hash, Target};
    use crate::core::{TransactionInput, TransactionOutput};
    use crate::testnet::{easy_params, find_nonce, funded_chain, signed_transfer};
    use crate::wallet::Account;

    #[test]
    fn test_sign_and_verify_input() {
        let engine = ProofOfWork::new(easy_params());
        let account = Account::new().unwrap();
        let pointer = TransactionOutputPointer::new(Hash::digest(b"tx"), 1);
        let signature = engine.sign_input(account.get_private_key(), &pointer).unwrap();

        assert!(engine.verify_input(account.get_public_key(), &pointer, &signature));

        let other = TransactionOutputPointer::new(Hash::digest(b"tx"), 2);
        assert!(!engine.verify_input(account.get_public_key(), &other, &signature));
        assert!(!engine.verify_input(b"not a key", &pointer, &signature));
        assert!(!engine.verify_input(
            account.get_public_key(),
            &pointer,
            &Signature(vec![0u8; 3])
        ));
    }

    #[test]
    fn test_valid_transfer_and_fee() {
        let (engine, chain, alice) = funded_chain();
        let bob = Address([2u8; 32]);
        let value = chain.get_account_value(&alice.get_address());

        let tx = signed_transfer(&engine, &chain, &alice, vec![(bob, value - 3)]);
        assert!(engine.validate_pending_transaction(&chain, &tx));
        assert_eq!(engine.check_pending_transaction(&chain, &tx).unwrap(), 3);
    }

    #[test]
    fn test_overspend_is_rejected() {
        let (engine, chain, alice) = funded_chain();
        let value = chain.get_account_value(&alice.get_address());

        let tx = signed_transfer(&engine, &chain, &alice, vec![(Address([2u8; 32]), value + 1)]);
        assert!(!engine.validate_pending_transaction(&chain, &tx));

        let overflow = signed_transfer(
            &engine,
            &chain,
            &alice,
            vec![(Address([2u8; 32]), u64::MAX), (Address([3u8; 32]), 1)],
        );
        assert!(!engine.validate_pending_transaction(&chain, &overflow));
    }

    #[test]
    fn test_foreign_and_tampered_inputs_are_rejected() {
        let (engine, chain, alice) = funded_chain();
        let mallory = Account::new().unwrap();
        let pointer = chain.get_unspent_outputs(&alice.get_address())[0];

        // mallory signs alice's output with her own key
        let signature = engine.sign_input(mallory.get_private_key(), &pointer).unwrap();
        let stolen = Transaction::new(
            1,
            vec![TransactionInput::new(
                pointer,
                signature,
                mallory.get_public_key().to_vec(),
            )],
            vec![TransactionOutput::new(mallory.get_address(), 1)],
        );
        assert!(!engine.validate_pending_transaction(&chain, &stolen));

        // alice's key with mallory's signature
        let signature = engine.sign_input(mallory.get_private_key(), &pointer).unwrap();
        let forged = Transaction::new(
            1,
            vec![TransactionInput::new(
                pointer,
                signature,
                alice.get_public_key().to_vec(),
            )],
            vec![TransactionOutput::new(mallory.get_address(), 1)],
        );
        assert!(!engine.validate_pending_transaction(&chain, &forged));
    }

    #[test]
    fn test_duplicate_input_and_no_inputs_are_rejected() {
        let (engine, chain, alice) = funded_chain();
        let pointer = chain.get_unspent_outputs(&alice.get_address())[0];
        let input = TransactionInput::new(
            pointer,
            engine.sign_input(alice.get_private_key(), &pointer).unwrap(),
            alice.get_public_key().to_vec(),
        );
        let doubled = Transaction::new(
            1,
            vec![input.clone(), input],
            vec![TransactionOutput::new(Address([2u8; 32]), 1)],
        );
        assert!(!engine.validate_pending_transaction(&chain, &doubled));

        let minted = Transaction::new_coinbase(1, Address([2u8; 32]), 1);
        assert!(!engine.validate_pending_transaction(&chain, &minted));
    }

    #[test]
    fn test_coinbase_rules() {
        let (engine, chain, _) = funded_chain();
        let params = engine.get_params();
        let reward = params.compute_block_reward(chain.last_block_number() + 1);
        let receiver = Address([4u8; 32]);

        let good = Transaction::new_coinbase(1, receiver, reward);
        assert!(engine.validate_coinbase_transaction(&chain, &good));

        let wrong_amount = Transaction::new_coinbase(1, receiver, reward - 1);
        assert!(!engine.validate_coinbase_transaction(&chain, &wrong_amount));

        let two_outputs = Transaction::new(
            1,
            vec![],
            vec![
                TransactionOutput::new(receiver, reward),
                TransactionOutput::new(receiver, 0),
            ],
        );
        assert!(!engine.validate_coinbase_transaction(&chain, &two_outputs));

        let with_input = Transaction::new(
            1,
            vec![TransactionInput::new(
                TransactionOutputPointer::new(Hash::default(), 0),
                Signature::default(),
                vec![],
            )],
            vec![TransactionOutput::new(receiver, reward)],
        );
        assert!(!engine.validate_coinbase_transaction(&chain, &with_input));
    }

    #[test]
    fn test_block_checks() {
        let (engine, chain, alice) = funded_chain();
        let params = engine.get_params().clone();
        let (last_hash, number) = chain.get_last_block_info();
        let coinbase = || {
            Transaction::new_coinbase(1, alice.get_address(), params.compute_block_reward(number + 1))
        };

        let unsolved = Block::new(&params, last_hash, number + 1, vec![], coinbase()).unwrap();
        let solved = find_nonce(unsolved.clone(), true);
        assert!(engine.validate_block(&chain, &solved));

        let unlinked = find_nonce(
            Block::new(&params, Hash::digest(b"elsewhere"), number + 1, vec![], coinbase()).unwrap(),
            true,
        );
        assert!(!engine.validate_block(&chain, &unlinked));

        let failing = find_nonce(unsolved, false);
        assert!(!engine.validate_block(&chain, &failing));

        let other_target = ProtocolParams {
            target: Target([0xFF; 4]),
            ..params.clone()
        };
        let retargeted = find_nonce(
            Block::new(&other_target, last_hash, number + 1, vec![], coinbase()).unwrap(),
            true,
        );
        assert!(!engine.validate_block(&chain, &retargeted));
    }

    #[test]
    fn test_block_rejects_double_spend_across_transactions() {
        let (engine, chain, alice) = funded_chain();
        let params = engine.get_params().clone();
        let value = chain.get_account_value(&alice.get_address());
        let first = signed_transfer(&engine, &chain, &alice, vec![(Address([2u8; 32]), value)]);
        let second = signed_transfer(&engine, &chain, &alice, vec![(Address([3u8; 32]), value)]);
        assert!(engine.validate_pending_transaction(&chain, &first));
        assert!(engine.validate_pending_transaction(&chain, &second));

        let (last_hash, number) = chain.get_last_block_info();
        let coinbase =
            Transaction::new_coinbase(1, alice.get_address(), params.compute_block_reward(number + 1));
        let block = find_nonce(
            Block::new(&params, last_hash, number + 1, vec![first, second], coinbase).unwrap(),
            true,
        );
        assert!(matches!(
            engine.check_block(&chain, &block),
            Err(BlockchainError::InvalidBlock(_))
        ));
        // the authoritative chain was not touched
        assert_eq!(chain.get_account_value(&alice.get_address()), value);
    }

    #[test]
    fn test_block_rejects_tampered_body() {
        let (engine, chain, alice) = funded_chain();
        let params = engine.get_params().clone();
        let value = chain.get_account_value(&alice.get_address());
        let tx = signed_transfer(&engine, &chain, &alice, vec![(Address([2u8; 32]), value)]);

        let (last_hash, number) = chain.get_last_block_info();
        let coinbase =
            Transaction::new_coinbase(1, alice.get_address(), params.compute_block_reward(number + 1));
        let honest = Block::new(&params, last_hash, number + 1, vec![], coinbase.clone()).unwrap();
        let header_only = Block::new(&params, last_hash, number + 1, vec![tx], coinbase).unwrap();

        // header committing to an empty body, paired with a non-empty body
        let tampered = Block::from_parts(
            honest.get_header().clone(),
            header_only.get_body().to_vec(),
            header_only.get_coinbase().clone(),
        );
        let tampered = find_nonce(tampered, true);
        assert!(!engine.validate_block(&chain, &tampered));
    }

    #[test]
    fn test_block_rejects_wrong_protocol_version() {
        let (engine, chain, alice) = funded_chain();
        let params = engine.get_params().clone();
        let (last_hash, number) = chain.get_last_block_info();
        let coinbase =
            Transaction::new_coinbase(1, alice.get_address(), params.compute_block_reward(number + 1));
        let v2 = ProtocolParams {
            protocol_version: 2,
            ..params
        };
        let block = find_nonce(
            Block::new(&v2, last_hash, number + 1, vec![], coinbase).unwrap(),
            true,
        );
        assert!(!engine.validate_block(&chain, &block));
    }
}
