//! HTTP response DTOs and error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::conditional_orders::TriggerState;
use crate::domain::order_staging::{OrderSide, TradingError};
use crate::domain::shared::{Money, Quantity};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Running trigger watchers.
    pub active_watchers: usize,
}

/// Balance after a deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Account holder.
    pub user_id: String,
    /// Available funds.
    pub balance: Money,
}

/// Current price of a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    /// Requesting user.
    pub user_id: String,
    /// Symbol.
    pub symbol: String,
    /// Price per share.
    pub price: Money,
    /// RFC 3339 time the price was fetched.
    pub as_of: String,
}

/// Standing amount after an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingAmountResponse {
    /// Account holder.
    pub user_id: String,
    /// Symbol.
    pub symbol: String,
    /// Side executed on fire.
    pub side: OrderSide,
    /// Total shares traded when the trigger fires.
    pub quantity: Quantity,
}

/// A trigger as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    /// Account holder.
    pub user_id: String,
    /// Symbol.
    pub symbol: String,
    /// Side executed on fire.
    pub side: OrderSide,
    /// Target price.
    pub target_price: Money,
    /// Watcher state.
    pub state: TriggerState,
}

/// Acknowledgement of a trigger cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTriggerResponse {
    /// Account holder.
    pub user_id: String,
    /// Symbol.
    pub symbol: String,
    /// Side.
    pub side: OrderSide,
    /// Always true on success.
    pub cancelled: bool,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

/// A [`TradingError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TradingError);

impl ApiError {
    /// Status code for the wrapped error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            TradingError::InsufficientFunds { .. }
            | TradingError::InsufficientHoldings { .. }
            | TradingError::NoPendingOrder { .. } => StatusCode::CONFLICT,
            TradingError::InvalidQuantity { .. }
            | TradingError::InvalidAmount { .. }
            | TradingError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TradingError::TriggerNotFound { .. } => StatusCode::NOT_FOUND,
            TradingError::QuoteUnavailable { .. } | TradingError::LedgerUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl From<TradingError> for ApiError {
    fn from(error: TradingError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiErrorResponse {
            code: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
