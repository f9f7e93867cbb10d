use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of decimal places carried by an amount (minor units per major: 10^2).
pub const SCALE: u32 = 2;

const MINOR_PER_MAJOR: i64 = 100;

/// A strictly positive monetary amount in minor units (cents).
///
/// Amounts are integers to rule out floating-point drift; conversion from
/// decimal strings happens exactly via `rust_decimal` at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Creates an amount from raw minor units. Rejects zero and negatives.
    pub fn new(minor: i64) -> Result<Self> {
        if minor > 0 {
            Ok(Self(minor))
        } else {
            Err(LedgerError::validation("amount must be positive"))
        }
    }

    /// Converts a decimal major-unit value (e.g. `10.50`) into an amount.
    ///
    /// Rejects values with more than [`SCALE`] decimal places, values outside
    /// the `i64` minor-unit range, and non-positive values.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        let minor = decimal_to_minor(value)?;
        Self::new(minor)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| LedgerError::validation(format!("unparseable amount: {s:?}")))?;
        Self::from_decimal(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_minor(f, self.0)
    }
}

/// A non-negative account balance in minor units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Balance(i64);

impl Balance {
    pub const ZERO: Self = Self(0);

    /// Creates a balance from raw minor units. Rejects negatives.
    pub fn new(minor: i64) -> Result<Self> {
        if minor >= 0 {
            Ok(Self(minor))
        } else {
            Err(LedgerError::validation("balance must not be negative"))
        }
    }

    /// Converts a decimal major-unit value into a balance.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        Self::new(decimal_to_minor(value)?)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Applies a signed minor-unit delta. `None` when the result would be
    /// negative or overflow `i64`.
    pub fn checked_adjust(&self, delta: i64) -> Option<Self> {
        match self.0.checked_add(delta) {
            Some(minor) if minor >= 0 => Some(Self(minor)),
            _ => None,
        }
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_minor(f, self.0)
    }
}

fn decimal_to_minor(value: Decimal) -> Result<i64> {
    let scaled = value
        .checked_mul(Decimal::from(MINOR_PER_MAJOR))
        .ok_or_else(|| LedgerError::validation("amount out of range"))?;
    if !scaled.fract().is_zero() {
        return Err(LedgerError::validation(format!(
            "amount {value} has more than {SCALE} decimal places"
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| LedgerError::validation("amount out of range"))
}

fn write_minor(f: &mut fmt::Formatter<'_>, minor: i64) -> fmt::Result {
    write!(f, "{}.{:02}", minor / MINOR_PER_MAJOR, minor % MINOR_PER_MAJOR)
}
