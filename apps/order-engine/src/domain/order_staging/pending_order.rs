//! Pending Order
//!
//! A reservation made at stage time and consumed exactly once by a commit
//! or a cancel.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, OrderId, Quantity, Symbol, Timestamp, UserId};

use super::{OrderSide, OrderSizing};

/// A staged, uncommitted order.
///
/// For a buy, `amount` is the cost already debited from the balance.
/// For a sell, `quantity` shares are already debited from holdings and
/// `amount` is the proceeds to credit on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    /// Order identifier.
    pub id: OrderId,
    /// Owner of the reservation.
    pub user: UserId,
    /// Buy or sell.
    pub side: OrderSide,
    /// Symbol traded.
    pub symbol: Symbol,
    /// Whole shares reserved.
    pub quantity: Quantity,
    /// Per-share quote used for sizing.
    pub price: Money,
    /// `quantity * price`.
    pub amount: Money,
    /// When the reservation was made.
    pub staged_at: Timestamp,
}

impl PendingOrder {
    /// Build a new pending order from a sizing result.
    #[must_use]
    pub fn new(user: UserId, side: OrderSide, symbol: Symbol, sizing: OrderSizing) -> Self {
        Self {
            id: OrderId::generate(),
            user,
            side,
            symbol,
            quantity: sizing.quantity,
            price: sizing.price,
            amount: sizing.notional,
            staged_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_copies_sizing() {
        let sizing = OrderSizing {
            quantity: Quantity::new(5),
            price: Money::new(dec!(50)),
            notional: Money::new(dec!(250)),
        };
        let order = PendingOrder::new(
            UserId::new("u1"),
            OrderSide::Buy,
            Symbol::new("ABC"),
            sizing,
        );

        assert_eq!(order.quantity, Quantity::new(5));
        assert_eq!(order.amount, Money::dollars(250));
        assert_eq!(order.side, OrderSide::Buy);
    }
}
