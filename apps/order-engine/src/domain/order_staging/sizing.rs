//! Order Sizing
//!
//! Converts a dollar amount into a whole share count at a quoted price.
//! Share counts round down; the remainder of the amount is never reserved.

use rust_decimal::prelude::ToPrimitive;

use crate::domain::shared::{Money, Quantity};

use super::TradingError;

/// Result of sizing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSizing {
    /// Whole shares to trade.
    pub quantity: Quantity,
    /// Per-share price used.
    pub price: Money,
    /// `quantity * price`.
    pub notional: Money,
}

/// Size an order from a dollar amount: `quantity = floor(amount / price)`.
///
/// # Errors
///
/// - `InvalidQuantity` if the amount is not positive, buys zero shares,
///   or buys more than [`Quantity::MAX_ORDER`]
/// - `InvalidAmount` if `price` is not positive
pub fn size_by_amount(amount: Money, price: Money) -> Result<OrderSizing, TradingError> {
    if !amount.is_positive() {
        return Err(TradingError::invalid_quantity(format!(
            "amount must be positive, got {amount}"
        )));
    }
    ensure_positive_price(price)?;

    let shares = amount
        .amount()
        .checked_div(price.amount())
        .map(|q| q.floor())
        .and_then(|q| q.to_u64())
        .ok_or_else(|| TradingError::invalid_quantity("order size out of range"))?;

    size_by_quantity(Quantity::new(shares), price)
}

/// Size an order from an explicit share count.
///
/// # Errors
///
/// - `InvalidAmount` if `price` is not positive
/// - `InvalidQuantity` if `quantity` is zero, above [`Quantity::MAX_ORDER`],
///   or the notional overflows
pub fn size_by_quantity(quantity: Quantity, price: Money) -> Result<OrderSizing, TradingError> {
    ensure_positive_price(price)?;

    if quantity.is_zero() {
        return Err(TradingError::invalid_quantity(format!(
            "amount does not cover one share at {price}"
        )));
    }
    if quantity > Quantity::MAX_ORDER {
        return Err(TradingError::invalid_quantity(format!(
            "{quantity} shares exceeds the per-order maximum of {}",
            Quantity::MAX_ORDER
        )));
    }

    let notional = price
        .checked_mul_quantity(quantity)
        .ok_or_else(|| TradingError::invalid_quantity("order notional out of range"))?;

    Ok(OrderSizing {
        quantity,
        price,
        notional,
    })
}

fn ensure_positive_price(price: Money) -> Result<(), TradingError> {
    if price.is_positive() {
        Ok(())
    } else {
        Err(TradingError::invalid_amount(format!(
            "price must be positive, got {price}"
        )))
    }
}
