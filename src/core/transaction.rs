// Transactions follow the UTXO model: every input claims one output of an
// earlier transaction and proves ownership with a signature over the pointer;
// every output locks an amount to a receiver address.
// A transaction's identity is the hash of its canonical encoding.

use crate::core::types::{Address, Hash, Signature};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, decode, encode};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Identifies one output of one transaction
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct TransactionOutputPointer {
    pub transaction_hash: Hash,
    pub output_index: u16,
}

impl TransactionOutputPointer {
    pub fn new(transaction_hash: Hash, output_index: u16) -> TransactionOutputPointer {
        TransactionOutputPointer {
            transaction_hash,
            output_index,
        }
    }

    /// The bytes an owner signs to spend this output:
    /// `transaction_hash ++ output_index` in canonical encoding.
    pub fn signing_bytes(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn hash(&self) -> Hash {
        Hash::of(self)
    }
}

/// Locks `amount` (smallest currency unit) to `receiver_address`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TransactionOutput {
    pub receiver_address: Address,
    pub amount: u64,
}

impl TransactionOutput {
    pub fn new(receiver_address: Address, amount: u64) -> TransactionOutput {
        TransactionOutput {
            receiver_address,
            amount,
        }
    }
}

/// Proof that the spender owns the referenced output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TransactionInputVerification {
    pub signature: Signature,
    pub encoded_public_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TransactionInput {
    pub output_pointer: TransactionOutputPointer,
    pub verification: TransactionInputVerification,
}

impl TransactionInput {
    pub fn new(
        output_pointer: TransactionOutputPointer,
        signature: Signature,
        encoded_public_key: Vec<u8>,
    ) -> TransactionInput {
        TransactionInput {
            output_pointer,
            verification: TransactionInputVerification {
                signature,
                encoded_public_key,
            },
        }
    }

    /// Address derived from the public key embedded in the verification
    pub fn sender_address(&self) -> Address {
        Address::from_public_key(&self.verification.encoded_public_key)
    }
}

/// An immutable transfer of value. Zero inputs marks a coinbase transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Transaction {
    protocol_version: u16,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
    timestamp: i64,
}

impl Transaction {
    pub fn new(
        protocol_version: u16,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
    ) -> Transaction {
        Self::from_parts(protocol_version, inputs, outputs, current_timestamp())
    }

    /// Build a transaction with an explicit timestamp (decoding, tests).
    pub fn from_parts(
        protocol_version: u16,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        timestamp: i64,
    ) -> Transaction {
        Transaction {
            protocol_version,
            inputs,
            outputs,
            timestamp,
        }
    }

    /// A block reward: no inputs, one output paying `amount` to `receiver`.
    pub fn new_coinbase(protocol_version: u16, receiver: Address, amount: u64) -> Transaction {
        Self::new(
            protocol_version,
            vec![],
            vec![TransactionOutput::new(receiver, amount)],
        )
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn hash(&self) -> Hash {
        Hash::of(self)
    }

    pub fn get_protocol_version(&self) -> u16 {
        self.protocol_version
    }

    pub fn get_inputs(&self) -> &[TransactionInput] {
        self.inputs.as_slice()
    }

    pub fn get_outputs(&self) -> &[TransactionOutput] {
        self.outputs.as_slice()
    }

    pub fn get_output(&self, index: u16) -> Option<&TransactionOutput> {
        self.outputs.get(usize::from(index))
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Pointers to each of this transaction's outputs, in output order
    pub fn output_pointers(&self) -> impl Iterator<Item = TransactionOutputPointer> + '_ {
        let hash = self.hash();
        (0..self.outputs.len()).map(move |idx| TransactionOutputPointer::new(hash, idx as u16))
    }

    pub fn get_output_value(&self) -> Result<u64> {
        let mut total = 0u64;
        for output in &self.outputs {
            total = total.checked_add(output.amount).ok_or_else(|| {
                BlockchainError::InvalidTransaction("Output value overflow".to_string())
            })?;
        }
        Ok(total)
    }

    pub fn serialize(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        let tx: Transaction = decode(bytes)?;
        tx.check_output_count()?;
        Ok(tx)
    }

    /// Every output must be addressable by a 16-bit output index.
    pub(crate) fn check_output_count(&self) -> Result<()> {
        if self.outputs.len() > usize::from(u16::MAX) + 1 {
            return Err(BlockchainError::Serialization(
                "Output count exceeds the 16-bit output index".to_string(),
            ));
        }
        Ok(())
    }
}
