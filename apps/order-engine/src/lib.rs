// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::similar_names
    )
)]

//! Order Engine - Rust Core Library
//!
//! Two-phase order staging and conditional-order execution.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic
//!   - `order_staging`: pending orders, LIFO stacks, share sizing, trading errors
//!   - `conditional_orders`: trigger keys, target prices, watcher states
//!   - `shared`: money, quantities, symbols, identifiers
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `LedgerPort`, `QuoteSourcePort`
//!   - `use_cases`: `TransactionCoordinator` (stage, commit, cancel)
//!   - `services`: `TriggerMonitorService` (one watcher per trigger)
//!   - `dto`: Data transfer objects for API boundaries
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: in-memory ledger
//!   - `quotes`: HTTP quote client with a TTL cache
//!   - `http`: axum REST routes
//!   - `config`: Dependency injection container
//!
//! Cross-cutting: `config` (YAML settings) and `observability`
//! (tracing and Prometheus metrics).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Logging and metrics.
pub mod observability;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::conditional_orders::{Trigger, TriggerKey, TriggerState};
pub use domain::order_staging::{OrderSide, PendingOrder, PendingOrderStack, TradingError};
pub use domain::shared::{Money, OrderId, Quantity, Symbol, Timestamp, UserId};

// Application re-exports
pub use application::dto::{AccountSummaryDto, PendingOrderDto};
pub use application::ports::{
    LedgerError, LedgerPort, Quote, QuoteError, QuoteSourcePort,
};
pub use application::services::{
    FireOutcome, FireReport, TriggerMonitorConfig, TriggerMonitorService,
};
pub use application::use_cases::TransactionCoordinator;

// Infrastructure re-exports
pub use infrastructure::config::{Container, ProductionContainer};
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::persistence::InMemoryLedger;
pub use infrastructure::quotes::{CachedQuoteSource, HttpQuoteSource, MockQuoteSource};
