use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use std::fmt;

use super::hash::BlockHash;
use super::transaction::{CanonicalTransaction, Transaction};

/// Errors that can occur while encoding a block
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("Encoding error: {0}")]
    EncodingError(#[from] bincode::Error),
}

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Creation time in nanoseconds since the Unix epoch
    timestamp: i64,

    /// Proof of work (nonce)
    nonce: u64,

    /// Hash of the previous block
    previous_hash: BlockHash,

    /// Transactions committed by this block, in submission order
    transactions: Vec<Transaction>,
}

/// Field layout hashed for a block. The order here is load-bearing.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    nonce: u64,
    previous_hash: &'a [u8; 32],
    timestamp: i64,
    transactions: Vec<CanonicalTransaction<'a>>,
}

/// Current wall-clock time in nanoseconds since the Unix epoch
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

impl Block {
    /// Creates a new block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `nonce` - The proof of work
    /// * `previous_hash` - The hash of the previous block
    /// * `transactions` - The transactions to include, owned by the block
    pub fn new(nonce: u64, previous_hash: BlockHash, transactions: Vec<Transaction>) -> Self {
        Self::with_timestamp(current_timestamp(), nonce, previous_hash, transactions)
    }

    /// Creates a new block with an explicit timestamp
    pub fn with_timestamp(
        timestamp: i64,
        nonce: u64,
        previous_hash: BlockHash,
        transactions: Vec<Transaction>,
    ) -> Self {
        Block {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// The all-zero block whose hash the genesis block points at
    pub fn placeholder() -> Self {
        Self::with_timestamp(0, 0, BlockHash::zero(), Vec::new())
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn previous_hash(&self) -> &BlockHash {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    /// Moves the nonce to the next candidate. Returns false on overflow.
    pub(crate) fn advance_nonce(&mut self) -> bool {
        match self.nonce.checked_add(1) {
            Some(next) => {
                self.nonce = next;
                true
            }
            None => false,
        }
    }

    /// Deterministic bytes for hashing
    ///
    /// Fields are encoded in the order nonce, previous hash, timestamp,
    /// transactions, with each transaction in its own canonical form.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, BlockError> {
        let canonical = CanonicalBlock {
            nonce: self.nonce,
            previous_hash: self.previous_hash.as_bytes(),
            timestamp: self.timestamp,
            transactions: self.transactions.iter().map(Transaction::canonical).collect(),
        };

        Ok(bincode::serialize(&canonical)?)
    }

    /// Calculates the SHA-256 hash of the block
    pub fn hash(&self) -> Result<BlockHash, BlockError> {
        Ok(BlockHash::digest(&self.canonical_bytes()?))
    }

    /// Dumps the block to stdout
    pub fn print(&self) {
        print!("{}", self);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timestamp         {}", self.timestamp)?;
        writeln!(f, "Nonce             {}", self.nonce)?;
        writeln!(f, "Previous_hash     {}", self.previous_hash)?;
        for transaction in &self.transactions {
            write!(f, "{}", transaction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Amount;

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            Transaction::new("C".into(), "D".into(), Amount::from_coins(10)),
            Transaction::new("F".into(), "H".into(), Amount::from_f64(5.7).unwrap()),
        ]
    }

    #[test]
    fn test_new_block() {
        let previous_hash = BlockHash::digest(b"previous");
        let block = Block::new(100, previous_hash, sample_transactions());

        assert_eq!(block.nonce(), 100);
        assert_eq!(block.previous_hash(), &previous_hash);
        assert_eq!(block.transactions().len(), 2);
        assert!(block.timestamp() > 0);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let previous_hash = BlockHash::digest(b"previous");
        let first = Block::with_timestamp(42, 7, previous_hash, sample_transactions());
        let second = Block::with_timestamp(42, 7, previous_hash, sample_transactions());

        assert_eq!(first.hash().unwrap(), second.hash().unwrap());
        assert_eq!(first.hash().unwrap(), first.clone().hash().unwrap());
        assert_eq!(first.hash().unwrap().to_hex().len(), 64);
    }

    #[test]
    fn test_hash_covers_every_field() {
        let previous_hash = BlockHash::digest(b"previous");
        let base = Block::with_timestamp(42, 7, previous_hash, sample_transactions());
        let base_hash = base.hash().unwrap();

        let other_nonce = Block::with_timestamp(42, 8, previous_hash, sample_transactions());
        let other_time = Block::with_timestamp(43, 7, previous_hash, sample_transactions());
        let other_prev = Block::with_timestamp(42, 7, BlockHash::zero(), sample_transactions());
        let mut reordered = sample_transactions();
        reordered.reverse();
        let other_order = Block::with_timestamp(42, 7, previous_hash, reordered);

        for block in [other_nonce, other_time, other_prev, other_order] {
            assert_ne!(block.hash().unwrap(), base_hash);
        }
    }

    #[test]
    fn test_placeholder_hash_is_fixed() {
        let first = Block::placeholder().hash().unwrap();
        let second = Block::placeholder().hash().unwrap();
        assert_eq!(first, second);

        // 8-byte nonce, 32 zero bytes, 8-byte timestamp, 8-byte empty length
        assert_eq!(Block::placeholder().canonical_bytes().unwrap(), vec![0u8; 56]);
        assert_eq!(first, BlockHash::digest(&[0u8; 56]));
    }

    #[test]
    fn test_advance_nonce() {
        let mut block = Block::with_timestamp(0, u64::MAX - 1, BlockHash::zero(), Vec::new());
        assert!(block.advance_nonce());
        assert_eq!(block.nonce(), u64::MAX);
        assert!(!block.advance_nonce());
    }

    #[test]
    fn test_display_lists_transactions() {
        let block = Block::with_timestamp(5, 1, BlockHash::zero(), sample_transactions());
        let dump = block.to_string();
        assert!(dump.contains("Nonce             1"));
        assert!(dump.contains(" transaction_value            5.7"));
    }
}
