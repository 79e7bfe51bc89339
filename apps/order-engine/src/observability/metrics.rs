//! Prometheus metrics for the order engine.
//!
//! Covers the order lifecycle (stage, commit, cancel, rejection), trigger
//! firings, watcher counts and quote cache efficiency.
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder, so these
//! helpers are safe to call from tests.

use std::net::SocketAddr;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for operation latency (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            // 100us to 5s; quote fetches dominate the upper end
            latency_buckets: vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a metrics configuration with a custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Install the Prometheus exporter, serving `/metrics` on `listen_addr`.
///
/// # Errors
///
/// Returns an error if the exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

// ============================================================================
// Order Lifecycle
// ============================================================================

/// Record a successful stage.
pub fn record_order_staged(side: &'static str, latency_seconds: f64) {
    counter!("orders_staged_total", "side" => side).increment(1);
    histogram!("order_stage_latency_seconds", "side" => side).record(latency_seconds);
}

/// Record a successful commit.
pub fn record_order_committed(side: &'static str) {
    counter!("orders_committed_total", "side" => side).increment(1);
}

/// Record a successful cancel.
pub fn record_order_cancelled(side: &'static str) {
    counter!("orders_cancelled_total", "side" => side).increment(1);
}

/// Record a rejected operation.
///
/// # Arguments
///
/// * `operation` - "stage", "commit", "cancel", "execute"
/// * `code` - Error code, e.g. "INSUFFICIENT_FUNDS"
pub fn record_order_rejection(operation: &'static str, code: &'static str) {
    counter!(
        "order_rejections_total",
        "operation" => operation,
        "code" => code
    )
    .increment(1);
}

// ============================================================================
// Conditional Orders
// ============================================================================

/// Record a trigger firing attempt.
///
/// * `outcome` - "executed" or "failed"
pub fn record_trigger_fire(side: &'static str, outcome: &'static str) {
    counter!("trigger_fires_total", "side" => side, "outcome" => outcome).increment(1);
}

/// Update the number of live trigger watchers.
pub fn set_active_watchers(count: usize) {
    gauge!("active_watchers").set(count as f64);
}

// ============================================================================
// Quotes
// ============================================================================

/// Record a quote cache lookup.
///
/// * `result` - "hit" or "miss"
pub fn record_quote_lookup(result: &'static str) {
    counter!("quote_cache_requests_total", "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert_eq!(config.listen_addr.port(), 9090);
        assert!(!config.latency_buckets.is_empty());
    }

    #[test]
    fn test_config_with_addr() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = MetricsConfig::with_addr(addr);
        assert_eq!(config.listen_addr.port(), 8080);
    }

    #[test]
    fn test_buckets_are_ascending() {
        let config = MetricsConfig::default();
        assert!(config.latency_buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_order_staged("buy", 0.002);
        record_order_committed("buy");
        record_order_cancelled("sell");
        record_order_rejection("stage", "INSUFFICIENT_FUNDS");
        record_trigger_fire("buy", "executed");
        set_active_watchers(3);
        record_quote_lookup("hit");
    }
}
