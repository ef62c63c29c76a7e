// Mining parameters and control

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::amount::Amount;
use super::hash::BlockHash;
use super::transaction::Transaction;

/// Number of leading hex zeros a block hash must have
pub const MINING_DIFFICULTY: usize = 3;

/// Reward credited to the ledger owner for every mined block
pub const MINING_REWARD: Amount = Amount::from_coins(1);

/// Optional bounds on a proof-of-work search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiningConfig {
    /// Give up after this many nonces have been tried
    pub max_attempts: Option<u64>,
}

/// A shared flag that stops an in-progress proof-of-work search
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the search stops before its next attempt
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A solved proof of work for a fixed set of block contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub nonce: u64,
    pub timestamp: i64,
    pub previous_hash: BlockHash,
    pub transactions: Vec<Transaction>,
    /// Number of nonces hashed, including the winning one
    pub attempts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());

        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_reward_is_one_coin() {
        assert_eq!(MINING_REWARD, Amount::from_f64(1.0).unwrap());
    }
}
