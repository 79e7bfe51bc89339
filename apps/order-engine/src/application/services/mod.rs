//! Application Services
//!
//! Long-running background functionality built on the use cases.

mod trigger_monitor;

pub use trigger_monitor::{
    FireOutcome, FireReport, TriggerMonitorConfig, TriggerMonitorService,
};
