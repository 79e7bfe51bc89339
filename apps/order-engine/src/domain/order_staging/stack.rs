//! Pending Order Stack
//!
//! LIFO of staged orders for one (user, side). Only the most recently
//! staged order is actionable.

use super::PendingOrder;

/// LIFO stack of pending orders.
#[derive(Debug, Clone, Default)]
pub struct PendingOrderStack {
    orders: Vec<PendingOrder>,
}

impl PendingOrderStack {
    /// Create an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { orders: Vec::new() }
    }

    /// Push a newly staged order on top.
    pub fn push(&mut self, order: PendingOrder) {
        self.orders.push(order);
    }

    /// Remove and return the most recent order.
    pub fn pop(&mut self) -> Option<PendingOrder> {
        self.orders.pop()
    }

    /// The most recent order, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&PendingOrder> {
        self.orders.last()
    }

    /// Number of staged orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Orders from most to least recent.
    pub fn iter_recent_first(&self) -> impl Iterator<Item = &PendingOrder> {
        self.orders.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_staging::{OrderSide, OrderSizing};
    use crate::domain::shared::{Money, Quantity, Symbol, UserId};

    fn order(symbol: &str, shares: u64) -> PendingOrder {
        PendingOrder::new(
            UserId::new("u1"),
            OrderSide::Buy,
            Symbol::new(symbol),
            OrderSizing {
                quantity: Quantity::new(shares),
                price: Money::dollars(10),
                notional: Money::dollars(10) * Quantity::new(shares),
            },
        )
    }

    #[test]
    fn pop_returns_most_recent_first() {
        let mut stack = PendingOrderStack::new();
        stack.push(order("AAA", 1));
        stack.push(order("BBB", 2));

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek().unwrap().symbol, Symbol::new("BBB"));
        assert_eq!(stack.pop().unwrap().symbol, Symbol::new("BBB"));
        assert_eq!(stack.pop().unwrap().symbol, Symbol::new("AAA"));
        assert!(stack.pop().is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn iter_recent_first_is_reverse_insertion() {
        let mut stack = PendingOrderStack::new();
        stack.push(order("AAA", 1));
        stack.push(order("BBB", 2));
        stack.push(order("CCC", 3));

        let symbols: Vec<_> = stack
            .iter_recent_first()
            .map(|o| o.symbol.as_str().to_string())
            .collect();
        assert_eq!(symbols, vec!["CCC", "BBB", "AAA"]);
    }
}
