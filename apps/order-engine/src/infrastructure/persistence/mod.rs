//! Persistence Adapters
//!
//! Implementations of the ledger port.

pub mod in_memory;

pub use in_memory::InMemoryLedger;
