//! Observability module for metrics and logging.

mod logging;
mod metrics;

pub use self::logging::{LogFormat, build_env_filter, init_tracing};
pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_order_cancelled, record_order_committed,
    record_order_rejection, record_order_staged, record_quote_lookup, record_trigger_fire,
    set_active_watchers,
};
