//! Trigger monitor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Conditional order watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggersConfig {
    /// Re-arm persisted triggers at startup.
    #[serde(default = "default_true")]
    pub restore_on_startup: bool,
    /// Seconds between price polls per trigger.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for TriggersConfig {
    fn default() -> Self {
        Self {
            restore_on_startup: true,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl TriggersConfig {
    /// Poll interval as a Duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

pub(crate) const fn default_true() -> bool {
    true
}

const fn default_poll_interval_secs() -> u64 {
    60
}
