//! HTTP/REST API adapter.
//!
//! Inbound adapter exposing the trading and trigger operations as JSON routes.

mod controller;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use request::*;
pub use response::*;
