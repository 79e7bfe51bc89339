//! Use Cases
//!
//! Application services that orchestrate domain logic over the ports.

mod transaction_coordinator;

pub use transaction_coordinator::TransactionCoordinator;
