//! Ports (Hexagonal Architecture)
//!
//! Interfaces the application layer depends on. Adapters live in
//! `infrastructure`.

mod ledger_port;
mod quote_source_port;

#[cfg(test)]
pub use ledger_port::MockLedgerPort;
pub use ledger_port::{LedgerError, LedgerPort};
pub use quote_source_port::{Quote, QuoteError, QuoteSourcePort};
