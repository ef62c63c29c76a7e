use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use std::fmt;

use super::amount::Amount;
use super::crypto::Address;

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Encoding error: {0}")]
    EncodingError(#[from] bincode::Error),
}

/// A transfer of coins from one address to another
///
/// Transactions are plain values: two transactions with the same fields are
/// the same transaction. No balance or signature checks are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Sender's address
    sender: Address,

    /// Recipient's address
    recipient: Address,

    /// Amount being transferred
    #[schema(value_type = f64)]
    amount: Amount,
}

/// Field layout hashed for a transaction. The order here is load-bearing.
#[derive(Serialize)]
pub(crate) struct CanonicalTransaction<'a> {
    sender: &'a str,
    recipient: &'a str,
    amount: i64,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer, zero and negative included
    pub fn new(sender: Address, recipient: Address, amount: Amount) -> Self {
        Transaction {
            sender,
            recipient,
            amount,
        }
    }

    /// Creates a mining reward paid by the blockchain itself
    pub fn reward(recipient: Address, amount: Amount) -> Self {
        Self::new(Address::blockchain(), recipient, amount)
    }

    /// Checks if the transaction is a mining reward
    pub fn is_reward(&self) -> bool {
        self.sender == Address::blockchain()
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Net effect of this transaction on the balance of `address`
    pub fn balance_change(&self, address: &Address) -> Amount {
        let mut change = Amount::ZERO;
        if &self.recipient == address {
            change += self.amount;
        }
        if &self.sender == address {
            change -= self.amount;
        }
        change
    }

    pub(crate) fn canonical(&self) -> CanonicalTransaction<'_> {
        CanonicalTransaction {
            sender: self.sender.as_str(),
            recipient: self.recipient.as_str(),
            amount: self.amount.minor_units(),
        }
    }

    /// Deterministic bytes for hashing: sender, recipient, amount
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(bincode::serialize(&self.canonical())?)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, " sender_blockchain_address    {}", self.sender)?;
        writeln!(f, " recipient_blockchain_address {}", self.recipient)?;
        writeln!(f, " transaction_value            {}", self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins(value: f64) -> Amount {
        Amount::from_f64(value).unwrap()
    }

    #[test]
    fn test_new_transaction() {
        let transaction = Transaction::new("A".into(), "B".into(), coins(1.0));

        assert_eq!(transaction.sender().as_str(), "A");
        assert_eq!(transaction.recipient().as_str(), "B");
        assert_eq!(transaction.amount(), coins(1.0));
        assert!(!transaction.is_reward());
    }

    #[test]
    fn test_permissive_amounts() {
        let negative = Transaction::new("A".into(), "B".into(), coins(-4.0));
        let zero = Transaction::new("A".into(), "B".into(), Amount::ZERO);
        assert!(negative.amount().is_negative());
        assert_eq!(zero.amount(), Amount::ZERO);
    }

    #[test]
    fn test_reward_transaction() {
        let reward = Transaction::reward("miner".into(), coins(1.0));
        assert_eq!(reward.sender(), &Address::blockchain());
        assert!(reward.is_reward());
    }

    #[test]
    fn test_balance_change() {
        let transaction = Transaction::new("A".into(), "B".into(), coins(2.5));
        assert_eq!(transaction.balance_change(&"A".into()), coins(-2.5));
        assert_eq!(transaction.balance_change(&"B".into()), coins(2.5));
        assert_eq!(transaction.balance_change(&"C".into()), Amount::ZERO);

        let to_self = Transaction::new("A".into(), "A".into(), coins(2.5));
        assert_eq!(to_self.balance_change(&"A".into()), Amount::ZERO);
    }

    #[test]
    fn test_canonical_bytes_are_stable() {
        let first = Transaction::new("C".into(), "D".into(), coins(10.0));
        let second = Transaction::new("C".into(), "D".into(), coins(10.0));
        assert_eq!(first.canonical_bytes().unwrap(), second.canonical_bytes().unwrap());

        let swapped = Transaction::new("D".into(), "C".into(), coins(10.0));
        assert_ne!(first.canonical_bytes().unwrap(), swapped.canonical_bytes().unwrap());
    }

    #[test]
    fn test_canonical_layout() {
        let transaction = Transaction::new("A".into(), "B".into(), Amount::from_minor_units(1));
        let bytes = transaction.canonical_bytes().unwrap();

        // u64 length prefix + "A", u64 length prefix + "B", i64 amount
        let mut expected = Vec::new();
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.push(b'A');
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.push(b'B');
        expected.extend_from_slice(&1i64.to_le_bytes());
        assert_eq!(bytes, expected);
    }
}
