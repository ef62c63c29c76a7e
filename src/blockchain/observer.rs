use log::{info, warn};

use super::block::Block;
use super::chain::LedgerError;
use super::hash::BlockHash;
use super::transaction::Transaction;

/// Receives ledger events
///
/// Every hook has an empty default. Hooks run without the chain or pool
/// locks held, so they may read from the ledger.
pub trait LedgerObserver: Send + Sync {
    /// A transaction entered the pending pool, which now holds `pending` entries
    fn transaction_added(&self, _transaction: &Transaction, _pending: usize) {}

    /// A proof-of-work search is starting over `transactions` entries
    fn mining_started(&self, _transactions: usize) {}

    /// A block was appended at position `height`
    fn block_mined(&self, _block: &Block, _hash: &BlockHash, _height: usize) {}

    /// A mining attempt ended without committing a block
    fn mining_failed(&self, _error: &LedgerError) {}
}

/// Reports ledger events through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl LedgerObserver for LogObserver {
    fn transaction_added(&self, transaction: &Transaction, pending: usize) {
        info!(
            target: "blockchain",
            "action=add_transaction, sender={}, recipient={}, amount={}, pending={}",
            transaction.sender(),
            transaction.recipient(),
            transaction.amount(),
            pending
        );
    }

    fn mining_started(&self, transactions: usize) {
        info!(target: "blockchain", "action=mining, status=started, transactions={}", transactions);
    }

    fn block_mined(&self, block: &Block, hash: &BlockHash, height: usize) {
        info!(
            target: "blockchain",
            "action=mining, status=success, height={}, nonce={}, hash={}",
            height,
            block.nonce(),
            hash
        );
    }

    fn mining_failed(&self, error: &LedgerError) {
        warn!(target: "blockchain", "action=mining, status=failed, error={}", error);
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LedgerObserver for NoopObserver {}
