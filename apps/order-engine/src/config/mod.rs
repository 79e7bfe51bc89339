//! Configuration loading, validation and environment variable interpolation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use order_engine::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! println!("HTTP port: {}", config.server.http_port);
//! ```

mod observability;
mod quotes;
mod server;
mod triggers;

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use quotes::QuotesConfig;
pub use server::ServerConfig;
pub use triggers::TriggersConfig;

use crate::observability::LogFormat;

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Quote server configuration.
    #[serde(default)]
    pub quotes: QuotesConfig,
    /// Trigger monitor configuration.
    #[serde(default)]
    pub triggers: TriggersConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Parsed metrics listen address.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the address does not parse.
    pub fn metrics_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.observability
            .metrics
            .listen_addr
            .parse()
            .map_err(|e| {
                ConfigError::ValidationError(format!(
                    "observability.metrics.listen_addr '{}' is invalid: {e}",
                    self.observability.metrics.listen_addr
                ))
            })
    }
}

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax. Unset or empty
/// variables without a default become empty strings.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |caps: &regex::Captures<'_>| {
        let default_value = caps.get(2).map_or("", |m| m.as_str());
        match caps.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
///
/// # Errors
///
/// Returns `ValidationError` naming the first offending field.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.quotes.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "quotes.ttl_secs must be positive".to_string(),
        ));
    }

    if config.quotes.request_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "quotes.request_timeout_ms must be positive".to_string(),
        ));
    }

    let base_url = config.quotes.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "quotes.base_url must be an http(s) URL, got '{base_url}'"
        )));
    }

    if config.triggers.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "triggers.poll_interval_secs must be positive".to_string(),
        ));
    }

    if LogFormat::parse(&config.observability.logging.format).is_none() {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of json, pretty, compact; got '{}'",
            config.observability.logging.format
        )));
    }

    if config.observability.metrics.enabled {
        let metrics_addr = config.metrics_addr()?;
        if metrics_addr.port() == config.server.http_port {
            return Err(ConfigError::ValidationError(
                "metrics port and server.http_port must be different".to_string(),
            ));
        }
    }

    Ok(())
}
