//! A single-node, in-memory ledger secured by proof of work
//!
//! The [`blockchain::Ledger`] keeps the chain of blocks and the pending
//! transaction pool, mines blocks by searching a nonce whose block hash
//! starts with three hex zeros, and computes balances by replaying the
//! committed chain. The [`api`] module exposes it over HTTP.

pub mod api;
pub mod blockchain;
pub mod config;

pub use blockchain::{Address, Amount, Block, BlockHash, Ledger, LedgerError, Transaction};
pub use config::Config;
