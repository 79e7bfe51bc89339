//! HTTP request DTOs.
//!
//! Decimal fields accept JSON numbers or strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_staging::TradingError;
use crate::domain::shared::{Symbol, UserId};

/// Request carrying only a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRequest {
    /// Account holder.
    pub user_id: String,
}

/// Request to deposit funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFundsRequest {
    /// Account holder.
    pub user_id: String,
    /// Dollars to deposit.
    pub amount: Decimal,
}

/// Request for a user and symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRequest {
    /// Account holder.
    pub user_id: String,
    /// Symbol.
    pub symbol: String,
}

/// Request to stage a buy or sell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOrderRequest {
    /// Account holder.
    pub user_id: String,
    /// Symbol to trade.
    pub symbol: String,
    /// Dollars to spend (buy) or raise (sell).
    pub amount: Decimal,
}

/// Request to add to a standing amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingAmountRequest {
    /// Account holder.
    pub user_id: String,
    /// Symbol.
    pub symbol: String,
    /// Shares to add.
    pub quantity: u64,
}

/// Request to set a trigger price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTriggerRequest {
    /// Account holder.
    pub user_id: String,
    /// Symbol to watch.
    pub symbol: String,
    /// Target price.
    pub price: Decimal,
}

pub(super) fn parse_user(raw: &str) -> Result<UserId, TradingError> {
    Ok(UserId::parse(raw)?)
}

pub(super) fn parse_symbol(raw: &str) -> Result<Symbol, TradingError> {
    Ok(Symbol::parse(raw)?)
}
