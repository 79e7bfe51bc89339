//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - **Driven Adapters (Outbound)**
//!   - `persistence/`: in-memory ledger
//!   - `quotes/`: HTTP quote server client, TTL cache, test double
//!
//! - **Driver Adapters (Inbound)**
//!   - `http/`: REST API controllers
//!
//! - `config/`: dependency injection container

pub mod config;
pub mod http;
pub mod persistence;
pub mod quotes;
