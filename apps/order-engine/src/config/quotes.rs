//! Quote server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upstream quote server and cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotesConfig {
    /// Base URL of the quote server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// How long a fetched quote stays fresh.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ttl_secs: default_ttl_secs(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl QuotesConfig {
    /// Cache freshness window.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Upstream request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

const fn default_ttl_secs() -> u64 {
    60
}

const fn default_request_timeout_ms() -> u64 {
    5_000
}
