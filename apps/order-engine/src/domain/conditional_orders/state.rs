//! Trigger lifecycle: `Armed -> Firing -> Cancelled`, or `Armed -> Cancelled`.
//!
//! A failed firing returns to `Armed`. `Cancelled` is terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a conditional order's watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TriggerState {
    /// Polling the price.
    Armed = 0,
    /// Executing the standing order.
    Firing = 1,
    /// Done, by firing or by explicit cancel.
    Cancelled = 2,
}

impl TriggerState {
    /// Encode for atomic storage.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode from atomic storage. Unknown values read as `Cancelled`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Armed,
            1 => Self::Firing,
            _ => Self::Cancelled,
        }
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Armed, Self::Firing)
                | (Self::Armed, Self::Cancelled)
                | (Self::Firing, Self::Armed)
                | (Self::Firing, Self::Cancelled)
        )
    }

    /// Whether the watcher is still live.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Armed => write!(f, "ARMED"),
            Self::Firing => write!(f, "FIRING"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}
