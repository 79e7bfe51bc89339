//! Order Staging Bounded Context
//!
//! Two-phase buy and sell orders. Staging sizes the order at the current
//! quote and reserves funds or shares; the reservation then waits on a
//! per-(user, side) LIFO stack until it is committed or cancelled.

pub mod errors;
pub mod pending_order;
pub mod side;
pub mod sizing;
pub mod stack;

pub use errors::TradingError;
pub use pending_order::PendingOrder;
pub use side::OrderSide;
pub use sizing::{OrderSizing, size_by_amount, size_by_quantity};
pub use stack::PendingOrderStack;
