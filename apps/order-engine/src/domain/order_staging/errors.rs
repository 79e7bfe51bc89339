//! Trading Errors
//!
//! Every failure a staging, commit, cancel or trigger operation can report.
//! Precondition failures leave all state untouched.

use thiserror::Error;

use crate::domain::shared::{DomainError, Money, Quantity, Symbol};

use super::OrderSide;

/// Errors reported by trading operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TradingError {
    /// Balance does not cover the cost of the order.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Cost of the order.
        required: Money,
        /// Current balance.
        available: Money,
    },

    /// Holdings do not cover the shares being sold.
    #[error("Insufficient holdings of {symbol}: required {required}, available {available}")]
    InsufficientHoldings {
        /// Symbol being sold.
        symbol: Symbol,
        /// Shares needed.
        required: Quantity,
        /// Shares owned.
        available: Quantity,
    },

    /// Commit or cancel with an empty stack.
    #[error("No pending {side} order")]
    NoPendingOrder {
        /// Side of the empty stack.
        side: OrderSide,
    },

    /// The order would trade zero (or too many) shares.
    #[error("Invalid quantity: {message}")]
    InvalidQuantity {
        /// Error details.
        message: String,
    },

    /// A dollar amount or price was not positive.
    #[error("Invalid amount: {message}")]
    InvalidAmount {
        /// Error details.
        message: String,
    },

    /// A symbol or user identifier was malformed.
    #[error("Invalid {field}: {message}")]
    InvalidInput {
        /// Offending field.
        field: String,
        /// Error details.
        message: String,
    },

    /// No usable quote for the symbol.
    #[error("Quote unavailable for {symbol}: {message}")]
    QuoteUnavailable {
        /// Symbol that was quoted.
        symbol: Symbol,
        /// Error details.
        message: String,
    },

    /// Cancel of a trigger that does not exist.
    #[error("No {side} trigger set for {symbol}")]
    TriggerNotFound {
        /// Symbol of the trigger.
        symbol: Symbol,
        /// Side of the trigger.
        side: OrderSide,
    },

    /// The ledger could not be reached.
    #[error("Ledger unavailable: {message}")]
    LedgerUnavailable {
        /// Error details.
        message: String,
    },
}

impl TradingError {
    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InsufficientHoldings { .. } => "INSUFFICIENT_HOLDINGS",
            Self::NoPendingOrder { .. } => "NO_PENDING_ORDER",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::QuoteUnavailable { .. } => "QUOTE_UNAVAILABLE",
            Self::TriggerNotFound { .. } => "TRIGGER_NOT_FOUND",
            Self::LedgerUnavailable { .. } => "LEDGER_UNAVAILABLE",
        }
    }

    /// Whether the failure came from a collaborator rather than the request.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::QuoteUnavailable { .. } | Self::LedgerUnavailable { .. }
        )
    }

    pub(crate) fn invalid_quantity(message: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }
}

impl From<DomainError> for TradingError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidValue { field, message } => Self::InvalidInput { field, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TradingError::InsufficientFunds {
            required: Money::dollars(250),
            available: Money::dollars(100),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: required $250.00, available $100.00"
        );

        let err = TradingError::NoPendingOrder {
            side: OrderSide::Sell,
        };
        assert_eq!(err.to_string(), "No pending SELL order");

        let err = TradingError::TriggerNotFound {
            symbol: Symbol::new("abc"),
            side: OrderSide::Buy,
        };
        assert_eq!(err.to_string(), "No BUY trigger set for ABC");
    }

    #[test]
    fn error_codes_and_transience() {
        let quote = TradingError::QuoteUnavailable {
            symbol: Symbol::new("ABC"),
            message: "timeout".to_string(),
        };
        assert_eq!(quote.code(), "QUOTE_UNAVAILABLE");
        assert!(quote.is_transient());
        assert!(!TradingError::invalid_quantity("zero").is_transient());
    }

    #[test]
    fn domain_error_maps_to_invalid_input() {
        let err: TradingError = DomainError::invalid("symbol", "empty").into();
        assert_eq!(
            err,
            TradingError::InvalidInput {
                field: "symbol".to_string(),
                message: "empty".to_string(),
            }
        );
    }
}
