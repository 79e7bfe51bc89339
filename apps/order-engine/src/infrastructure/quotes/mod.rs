//! Quote Source Adapters
//!
//! - `HttpQuoteSource`: upstream quote server over HTTP
//! - `CachedQuoteSource`: TTL cache around any source
//! - `MockQuoteSource`: scriptable prices for tests and local runs

mod cache;
mod http;
mod mock;

pub use cache::{CachedQuoteSource, DEFAULT_QUOTE_TTL};
pub use http::{HttpQuoteSource, HttpQuoteSourceConfig};
pub use mock::MockQuoteSource;
