//! Price triggers for conditional orders.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::order_staging::{OrderSide, TradingError};
use crate::domain::shared::{Money, Symbol, Timestamp, UserId};

/// Identity of a conditional order: one trigger per (user, symbol, side).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerKey {
    /// Owner.
    pub user: UserId,
    /// Symbol watched.
    pub symbol: Symbol,
    /// Side executed on fire.
    pub side: OrderSide,
}

impl TriggerKey {
    /// Create a new key.
    #[must_use]
    pub const fn new(user: UserId, symbol: Symbol, side: OrderSide) -> Self {
        Self { user, symbol, side }
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.user, self.symbol, self.side)
    }
}

/// A target price at which a standing order executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Which conditional order this is.
    pub key: TriggerKey,
    /// Price that must be crossed.
    pub target_price: Money,
    /// When the target was last set.
    pub set_at: Timestamp,
}

impl Trigger {
    /// Create a trigger, validating the target price.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `target_price` is not positive.
    pub fn new(key: TriggerKey, target_price: Money) -> Result<Self, TradingError> {
        if !target_price.is_positive() {
            return Err(TradingError::invalid_amount(format!(
                "trigger price must be positive, got {target_price}"
            )));
        }
        Ok(Self {
            key,
            target_price,
            set_at: Timestamp::now(),
        })
    }

    /// Whether `price` crosses the target.
    ///
    /// A buy fires at or below the target; a sell fires at or above it.
    #[must_use]
    pub fn is_crossed_by(&self, price: Money) -> bool {
        match self.key.side {
            OrderSide::Buy => price <= self.target_price,
            OrderSide::Sell => price >= self.target_price,
        }
    }
}
