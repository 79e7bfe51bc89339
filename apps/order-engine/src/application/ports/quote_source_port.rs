//! Quote Source Port (Driven Port)
//!
//! Current price per symbol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::order_staging::TradingError;
use crate::domain::shared::{Money, Symbol, Timestamp};

/// A price observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol quoted.
    pub symbol: Symbol,
    /// Per-share price.
    pub price: Money,
    /// When the price was fetched from upstream.
    pub as_of: Timestamp,
}

impl Quote {
    /// Create a quote observed now.
    #[must_use]
    pub fn new(symbol: Symbol, price: Money) -> Self {
        Self {
            symbol,
            price,
            as_of: Timestamp::now(),
        }
    }
}

/// Quote source error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    /// Upstream has no price for the symbol.
    #[error("Symbol not found: {symbol}")]
    SymbolNotFound {
        /// The unknown symbol.
        symbol: Symbol,
    },

    /// Upstream could not be reached or answered badly.
    #[error("Quote source unavailable for {symbol}: {message}")]
    Unavailable {
        /// Symbol requested.
        symbol: Symbol,
        /// Error details.
        message: String,
    },

    /// Upstream returned a price that cannot be traded at.
    #[error("Invalid price {price} for {symbol}")]
    InvalidPrice {
        /// Symbol requested.
        symbol: Symbol,
        /// Price returned.
        price: Money,
    },
}

impl QuoteError {
    /// Symbol the failed request was for.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        match self {
            Self::SymbolNotFound { symbol }
            | Self::Unavailable { symbol, .. }
            | Self::InvalidPrice { symbol, .. } => symbol,
        }
    }
}

impl From<QuoteError> for TradingError {
    fn from(err: QuoteError) -> Self {
        Self::QuoteUnavailable {
            symbol: err.symbol().clone(),
            message: err.to_string(),
        }
    }
}

/// Port for price lookups.
#[async_trait]
pub trait QuoteSourcePort: Send + Sync {
    /// Current quote for `symbol`.
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError>;
}
