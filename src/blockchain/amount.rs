use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::transaction::TransactionError;

/// Number of minor units in one whole coin (8 decimal places)
pub const MINOR_UNITS_PER_COIN: i64 = 100_000_000;

/// A signed fixed-point amount of coins, stored as integer minor units
///
/// Balances are replayed by summing many credits and debits, so amounts are
/// kept as integers to avoid rounding drift. The JSON form is a plain number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Amount(i64);

impl Amount {
    /// The zero amount
    pub const ZERO: Amount = Amount(0);

    /// Creates an amount from a count of minor units
    pub const fn from_minor_units(units: i64) -> Self {
        Amount(units)
    }

    /// Creates an amount from whole coins
    pub const fn from_coins(coins: i64) -> Self {
        Amount(coins.saturating_mul(MINOR_UNITS_PER_COIN))
    }

    /// Converts a decimal coin value, rounding to the nearest minor unit
    ///
    /// Negative and zero values are accepted. Values that are not finite or
    /// do not fit into the minor unit range are rejected.
    pub fn from_f64(value: f64) -> Result<Self, TransactionError> {
        if !value.is_finite() {
            return Err(TransactionError::InvalidAmount(format!(
                "Amount must be a finite number: {}",
                value
            )));
        }

        let scaled = (value * MINOR_UNITS_PER_COIN as f64).round();
        if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return Err(TransactionError::InvalidAmount(format!(
                "Amount out of range: {}",
                value
            )));
        }

        Ok(Amount(scaled as i64))
    }

    /// Returns the raw number of minor units
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns the amount as a decimal coin value
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS_PER_COIN as f64
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.0.unsigned_abs();
        let scale = MINOR_UNITS_PER_COIN as u64;
        let whole = units / scale;
        let fraction = format!("{:08}", units % scale);
        let fraction = fraction.trim_end_matches('0');
        let fraction = if fraction.is_empty() { "0" } else { fraction };

        if self.is_negative() {
            write!(f, "-{}.{}", whole, fraction)
        } else {
            write!(f, "{}.{}", whole, fraction)
        }
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> f64 {
        amount.as_f64()
    }
}

impl TryFrom<f64> for Amount {
    type Error = TransactionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::from_f64(value)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        *self = *self - rhs;
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(self.0.saturating_neg())
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}
