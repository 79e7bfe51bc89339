//! Ledger Port (Driven Port)
//!
//! Durable store of balances, holdings, standing amounts and triggers.
//!
//! Adjustments are atomic read-check-write operations: an adjustment that
//! would leave a balance or holding negative is rejected without mutating
//! anything, so a negative value is never observable.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conditional_orders::{Trigger, TriggerKey};
use crate::domain::order_staging::TradingError;
use crate::domain::shared::{Money, Quantity, Symbol, UserId};

/// Ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A balance debit exceeds the balance.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount requested.
        required: Money,
        /// Current balance.
        available: Money,
    },

    /// A holding debit exceeds the holding.
    #[error("Insufficient holdings of {symbol}: required {required}, available {available}")]
    InsufficientHoldings {
        /// Symbol debited.
        symbol: Symbol,
        /// Shares requested.
        required: Quantity,
        /// Shares held.
        available: Quantity,
    },

    /// Backing store failure.
    #[error("Ledger unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

impl From<LedgerError> for TradingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                required,
                available,
            } => Self::InsufficientFunds {
                required,
                available,
            },
            LedgerError::InsufficientHoldings {
                symbol,
                required,
                available,
            } => Self::InsufficientHoldings {
                symbol,
                required,
                available,
            },
            LedgerError::Unavailable { message } => Self::LedgerUnavailable { message },
        }
    }
}

/// Port for the account ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Available funds. Unknown users have a zero balance.
    async fn get_balance(&self, user: &UserId) -> Result<Money, LedgerError>;

    /// Atomically add `delta` (negative to debit) and return the new balance.
    ///
    /// Fails with `InsufficientFunds` and changes nothing if the result
    /// would be negative.
    async fn adjust_balance(&self, user: &UserId, delta: Money) -> Result<Money, LedgerError>;

    /// Shares owned. Unknown positions hold zero.
    async fn get_holding(&self, user: &UserId, symbol: &Symbol) -> Result<Quantity, LedgerError>;

    /// Atomically add `delta` shares (negative to debit) and return the new holding.
    ///
    /// Fails with `InsufficientHoldings` and changes nothing if the result
    /// would be negative.
    async fn adjust_holding(
        &self,
        user: &UserId,
        symbol: &Symbol,
        delta: i64,
    ) -> Result<Quantity, LedgerError>;

    /// Shares to trade when the key's trigger fires. Zero if unset.
    async fn get_standing_amount(&self, key: &TriggerKey) -> Result<Quantity, LedgerError>;

    /// Overwrite the standing amount.
    async fn set_standing_amount(
        &self,
        key: &TriggerKey,
        quantity: Quantity,
    ) -> Result<(), LedgerError>;

    /// Remove the standing amount. Returns whether one existed.
    async fn delete_standing_amount(&self, key: &TriggerKey) -> Result<bool, LedgerError>;

    /// The trigger for `key`, if set.
    async fn get_trigger(&self, key: &TriggerKey) -> Result<Option<Trigger>, LedgerError>;

    /// Insert or replace a trigger (last write wins).
    async fn put_trigger(&self, trigger: Trigger) -> Result<(), LedgerError>;

    /// Remove a trigger. Returns whether one existed.
    async fn delete_trigger(&self, key: &TriggerKey) -> Result<bool, LedgerError>;

    /// Every stored trigger.
    async fn list_triggers(&self) -> Result<Vec<Trigger>, LedgerError>;
}
