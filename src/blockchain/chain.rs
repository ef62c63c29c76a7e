use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use std::fmt;
use std::sync::Arc;

use super::amount::Amount;
use super::block::{Block, BlockError};
use super::crypto::Address;
use super::hash::BlockHash;
use super::mining::{CancelToken, MiningConfig, Proof, MINING_DIFFICULTY, MINING_REWARD};
use super::observer::{LedgerObserver, LogObserver};
use super::transaction::Transaction;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Block error: {0}")]
    BlockError(#[from] BlockError),

    #[error("The chain has no blocks")]
    EmptyChainAccess,

    #[error("Mining gave up after {attempts} attempts")]
    MiningTimeout { attempts: u64 },

    #[error("Mining was cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },

    #[error("Another block is already being mined")]
    ConcurrentMiningConflict,
}

/// A single-node, in-memory proof-of-work ledger
///
/// The chain is append-only and only `mine` appends to it. Mining is
/// serialized per ledger: it snapshots the pending pool when it starts,
/// commits exactly that snapshot plus the reward, and removes exactly the
/// snapshot from the pool. Transactions submitted while a search runs are
/// left for the next block.
pub struct Ledger {
    /// The chain of blocks, index 0 is the genesis block
    chain: RwLock<Vec<Block>>,

    /// Transactions waiting to be included in the next block
    pending_transactions: Mutex<Vec<Transaction>>,

    /// Held for the whole of a mining operation
    mining: Mutex<()>,

    /// Cancellation handle of the search in flight, if any
    active_search: Mutex<Option<CancelToken>>,

    /// Address credited with mining rewards
    owner_address: Address,

    /// Search bounds
    config: MiningConfig,

    observer: Arc<dyn LedgerObserver>,
}

impl Ledger {
    /// Creates a new ledger with a genesis block, reporting to the log
    ///
    /// # Arguments
    ///
    /// * `owner_address` - The address that receives mining rewards
    pub fn new(owner_address: impl Into<Address>) -> Result<Self, LedgerError> {
        Self::with_observer(owner_address, Arc::new(LogObserver))
    }

    /// Creates a new ledger reporting to the given observer
    pub fn with_observer(
        owner_address: impl Into<Address>,
        observer: Arc<dyn LedgerObserver>,
    ) -> Result<Self, LedgerError> {
        Self::with_config(owner_address, MiningConfig::default(), observer)
    }

    /// Creates a new ledger with explicit search bounds
    pub fn with_config(
        owner_address: impl Into<Address>,
        config: MiningConfig,
        observer: Arc<dyn LedgerObserver>,
    ) -> Result<Self, LedgerError> {
        let ledger = Ledger {
            chain: RwLock::new(Vec::new()),
            pending_transactions: Mutex::new(Vec::new()),
            mining: Mutex::new(()),
            active_search: Mutex::new(None),
            owner_address: owner_address.into(),
            config,
            observer,
        };

        ledger.create_genesis_block()?;

        Ok(ledger)
    }

    /// Creates the genesis block, linked to the all-zero placeholder block
    fn create_genesis_block(&self) -> Result<(), LedgerError> {
        let previous_hash = Block::placeholder().hash()?;
        let genesis_block = Block::new(0, previous_hash, Vec::new());

        self.chain.write().push(genesis_block);
        self.pending_transactions.lock().clear();

        Ok(())
    }

    pub fn owner_address(&self) -> &Address {
        &self.owner_address
    }

    pub fn config(&self) -> MiningConfig {
        self.config
    }

    /// Gets a copy of the entire chain
    pub fn chain(&self) -> Vec<Block> {
        self.chain.read().clone()
    }

    /// Number of committed blocks, genesis included
    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Result<Block, LedgerError> {
        self.chain
            .read()
            .last()
            .cloned()
            .ok_or(LedgerError::EmptyChainAccess)
    }

    /// Appends a transaction to the pending pool
    ///
    /// No balance, uniqueness or signature checks are made. Returns the
    /// number of transactions now waiting in the pool.
    pub fn add_transaction(
        &self,
        sender: impl Into<Address>,
        recipient: impl Into<Address>,
        amount: Amount,
    ) -> usize {
        let transaction = Transaction::new(sender.into(), recipient.into(), amount);

        let pending = {
            let mut pool = self.pending_transactions.lock();
            pool.push(transaction.clone());
            pool.len()
        };

        self.observer.transaction_added(&transaction, pending);
        pending
    }

    /// Takes an independent snapshot of the pending pool, in FIFO order
    pub fn copy_pending_pool(&self) -> Vec<Transaction> {
        self.pending_transactions.lock().clone()
    }

    /// Checks whether a candidate block built from the arguments has a hash
    /// whose first `difficulty` hex characters are zero
    pub fn valid_proof(
        nonce: u64,
        timestamp: i64,
        previous_hash: BlockHash,
        transactions: &[Transaction],
        difficulty: usize,
    ) -> Result<bool, LedgerError> {
        let guess = Block::with_timestamp(timestamp, nonce, previous_hash, transactions.to_vec());
        Ok(guess.hash()?.meets_difficulty(difficulty))
    }

    /// Searches a nonce for the current pending pool on top of the last block
    pub fn proof_of_work(&self) -> Result<Proof, LedgerError> {
        self.solve(self.copy_pending_pool(), &CancelToken::new())
    }

    /// Searches nonces from 0 upwards for a fixed set of transactions
    ///
    /// The timestamp and previous hash are fixed before the search starts,
    /// so the returned proof is the first nonce that works for them.
    fn solve(&self, transactions: Vec<Transaction>, cancel: &CancelToken) -> Result<Proof, LedgerError> {
        let previous_hash = self.last_block()?.hash()?;
        let mut candidate = Block::new(0, previous_hash, transactions);
        let mut attempts: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(LedgerError::MiningCancelled { attempts });
            }
            if self.config.max_attempts.map_or(false, |max| attempts >= max) {
                return Err(LedgerError::MiningTimeout { attempts });
            }

            attempts += 1;
            if candidate.hash()?.meets_difficulty(MINING_DIFFICULTY) {
                return Ok(Proof {
                    nonce: candidate.nonce(),
                    timestamp: candidate.timestamp(),
                    previous_hash,
                    transactions: candidate.into_transactions(),
                    attempts,
                });
            }

            if !candidate.advance_nonce() {
                return Err(LedgerError::MiningTimeout { attempts });
            }
        }
    }

    /// Mines a new block with the pending transactions and a reward for the owner
    ///
    /// # Returns
    ///
    /// The newly committed block
    pub fn mine(&self) -> Result<Block, LedgerError> {
        self.mine_with(&CancelToken::new()).map(|(_, block)| block)
    }

    /// Mines a new block, stopping early if `cancel` is triggered
    ///
    /// Returns the block together with its position in the chain. A cancelled
    /// or timed out search leaves the chain and the pool as they were.
    pub fn mine_with(&self, cancel: &CancelToken) -> Result<(usize, Block), LedgerError> {
        let _guard = self
            .mining
            .try_lock()
            .ok_or(LedgerError::ConcurrentMiningConflict)?;

        *self.active_search.lock() = Some(cancel.clone());
        let result = self.mine_locked(cancel);
        *self.active_search.lock() = None;

        if let Err(err) = &result {
            self.observer.mining_failed(err);
        }

        result
    }

    fn mine_locked(&self, cancel: &CancelToken) -> Result<(usize, Block), LedgerError> {
        let mut transactions = self.copy_pending_pool();
        let pooled = transactions.len();
        transactions.push(Transaction::reward(self.owner_address.clone(), MINING_REWARD));

        self.observer.mining_started(transactions.len());
        let proof = self.solve(transactions, cancel)?;

        // from here on cancel_mining reports false; a cancel that got in first still wins
        *self.active_search.lock() = None;
        if cancel.is_cancelled() {
            return Err(LedgerError::MiningCancelled {
                attempts: proof.attempts,
            });
        }

        let block = Block::with_timestamp(
            proof.timestamp,
            proof.nonce,
            proof.previous_hash,
            proof.transactions,
        );
        let hash = block.hash()?;

        let height = {
            let mut chain = self.chain.write();
            let mut pending = self.pending_transactions.lock();
            let committed = pooled.min(pending.len());
            *pending = pending.split_off(committed);
            chain.push(block.clone());
            chain.len() - 1
        };

        self.observer.block_mined(&block, &hash, height);
        Ok((height, block))
    }

    /// Cancels the search in flight. Returns false if nothing is being mined.
    pub fn cancel_mining(&self) -> bool {
        match self.active_search.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_mining(&self) -> bool {
        self.mining.is_locked()
    }

    /// Computes the balance of an address by replaying committed blocks
    ///
    /// Credits count positive and debits negative. The pending pool is ignored.
    pub fn calculate_total_amount(&self, address: &Address) -> Amount {
        self.chain
            .read()
            .iter()
            .flat_map(|block| block.transactions())
            .map(|transaction| transaction.balance_change(address))
            .sum()
    }

    /// Validates the whole chain
    ///
    /// Genesis must point at the placeholder block; every later block must
    /// point at its predecessor and meet the difficulty.
    pub fn is_valid(&self) -> bool {
        let chain = self.chain.read();

        let genesis = match chain.first() {
            Some(block) => block,
            None => return false,
        };
        match Block::placeholder().hash() {
            Ok(hash) if genesis.previous_hash() == &hash => {}
            _ => return false,
        }

        for pair in chain.windows(2) {
            let (previous_block, current_block) = (&pair[0], &pair[1]);

            match previous_block.hash() {
                Ok(hash) if current_block.previous_hash() == &hash => {}
                _ => return false,
            }

            match current_block.hash() {
                Ok(hash) if hash.meets_difficulty(MINING_DIFFICULTY) => {}
                _ => return false,
            }
        }

        true
    }

    /// Renders every block with a banner line per position
    pub fn dump(&self) -> String {
        let chain = self.chain.read();
        let mut out = String::new();

        for (i, block) in chain.iter().enumerate() {
            out.push_str(&format!("{} Chain {}  {}\n", "=".repeat(25), i, "=".repeat(25)));
            out.push_str(&block.to_string());
        }
        out.push_str(&format!("{}\n", "*".repeat(25)));

        out
    }

    /// Dumps the chain to stdout
    pub fn print(&self) {
        print!("{}", self.dump());
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("owner_address", &self.owner_address)
            .field("blocks", &self.len())
            .field("pending", &self.pending_transactions.lock().len())
            .field("config", &self.config)
            .finish()
    }
}
