//! Quantity value object for share counts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A whole number of shares.
///
/// Fractional shares are not traded, so the count is an unsigned integer.
/// Negative positions cannot be expressed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Zero shares.
    pub const ZERO: Self = Self(0);

    /// Largest share count a single order may carry.
    pub const MAX_ORDER: Self = Self(1_000_000_000_000);

    /// Create a new Quantity.
    #[must_use]
    pub const fn new(shares: u64) -> Self {
        Self(shares)
    }

    /// Get the share count.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns true if this is zero shares.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Signed delta for a ledger credit of this many shares.
    #[must_use]
    pub fn as_credit(&self) -> i64 {
        i64::try_from(self.0).unwrap_or(i64::MAX)
    }

    /// Signed delta for a ledger debit of this many shares.
    #[must_use]
    pub fn as_debit(&self) -> i64 {
        -self.as_credit()
    }

    /// Add, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Subtract, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
