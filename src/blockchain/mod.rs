// Blockchain module
//
// This module contains the core ledger implementation including:
// - Transaction and Block structures with canonical hashing
// - Fixed-point amounts
// - The Ledger: pending pool, proof of work and balances
// - Address provider (wallet key pairs)
// - Observer hooks used for logging

pub mod amount;
pub mod block;
pub mod chain;
pub mod crypto;
pub mod hash;
pub mod mining;
pub mod observer;
pub mod transaction;

// Re-export main components for easier access
pub use amount::Amount;
pub use block::{Block, BlockError};
pub use chain::{Ledger, LedgerError};
pub use crypto::{Address, Wallet};
pub use hash::BlockHash;
pub use mining::{CancelToken, MiningConfig, Proof, MINING_DIFFICULTY, MINING_REWARD};
pub use observer::{LedgerObserver, LogObserver, NoopObserver};
pub use transaction::{Transaction, TransactionError};
