//! Data Transfer Objects
//!
//! Flat, serializable views of domain state for the API boundary.

use serde::{Deserialize, Serialize};

use crate::domain::order_staging::{OrderSide, PendingOrder};
use crate::domain::shared::{Money, Quantity};

/// A staged order as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrderDto {
    /// Order identifier.
    pub order_id: String,
    /// Buy or sell.
    pub side: OrderSide,
    /// Symbol.
    pub symbol: String,
    /// Whole shares.
    pub quantity: Quantity,
    /// Per-share price used for sizing.
    pub price: Money,
    /// Cost (buy) or proceeds (sell).
    pub amount: Money,
    /// RFC 3339 staging time.
    pub staged_at: String,
}

impl From<&PendingOrder> for PendingOrderDto {
    fn from(order: &PendingOrder) -> Self {
        Self {
            order_id: order.id.to_string(),
            side: order.side,
            symbol: order.symbol.to_string(),
            quantity: order.quantity,
            price: order.price,
            amount: order.amount,
            staged_at: order.staged_at.to_rfc3339(),
        }
    }
}

/// Balance and outstanding reservations for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummaryDto {
    /// User identifier.
    pub user_id: String,
    /// Available funds, net of reserved buys.
    pub balance: Money,
    /// Staged buys, most recent first.
    pub pending_buys: Vec<PendingOrderDto>,
    /// Staged sells, most recent first.
    pub pending_sells: Vec<PendingOrderDto>,
}
