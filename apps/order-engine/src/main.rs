//! Order Engine Binary
//!
//! Starts the HTTP API and the trigger monitor.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-engine
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_ENGINE_CONFIG`: path to the YAML config (default: `config.yaml`
//!   if present, built-in defaults otherwise)
//! - `RUST_LOG`: overrides the configured log level
//!
//! Any `${VAR}` reference inside the config file is resolved from the
//! environment, including variables loaded from `.env`.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use order_engine::ProductionContainer;
use order_engine::config::{Config, DEFAULT_CONFIG_PATH, load_config};
use order_engine::infrastructure::http::create_router;
use order_engine::observability::{MetricsConfig, init_metrics, init_tracing};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Time allowed for watchers to stop after the server exits.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable naming the config file.
const CONFIG_ENV_VAR: &str = "ORDER_ENGINE_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = read_config()?;
    init_tracing(&config.observability.logging);

    tracing::info!("Starting Order Engine");
    log_config(&config);

    if config.observability.metrics.enabled {
        let addr = config.metrics_addr()?;
        init_metrics(&MetricsConfig::with_addr(addr))?;
    }

    let shutdown = CancellationToken::new();
    let container = ProductionContainer::from_config(&config, shutdown.clone())
        .context("failed to build quote client")?;
    let monitor = container.monitor();

    if config.triggers.restore_on_startup {
        match monitor.restore().await {
            Ok(count) => tracing::info!(count, "Restored trigger watchers"),
            Err(e) => tracing::warn!(error = %e, "Failed to restore triggers, continuing"),
        }
    }

    let app = create_router(container.app_state(env!("CARGO_PKG_VERSION")));
    let http_addr = config.server.listen_addr();
    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    tracing::info!(%http_addr, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  POST /add, /quote, /account");
    tracing::info!("  POST /buy, /commit_buy, /cancel_buy");
    tracing::info!("  POST /sell, /commit_sell, /cancel_sell");
    tracing::info!("  POST /set_buy_amount, /set_buy_trigger, /cancel_set_buy");
    tracing::info!("  POST /set_sell_amount, /set_sell_trigger, /cancel_set_sell");

    tokio::spawn(shutdown_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
        .context("HTTP server error")?;

    tracing::info!("HTTP server stopped");

    // Covers the server exiting on its own as well as a signal
    shutdown.cancel();
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, monitor.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Trigger watchers did not stop in time"
        );
    }

    tracing::info!("Order engine stopped");
    Ok(())
}

/// Load the config file named by `ORDER_ENGINE_CONFIG`, else `config.yaml`
/// if it exists, else the defaults.
fn read_config() -> anyhow::Result<Config> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return load_config(Some(&path)).with_context(|| format!("loading {path}"));
    }
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        return load_config(None).with_context(|| format!("loading {DEFAULT_CONFIG_PATH}"));
    }
    Ok(Config::default())
}

/// Log the loaded configuration.
fn log_config(config: &Config) {
    tracing::info!(
        http = %config.server.listen_addr(),
        quote_server = %config.quotes.base_url,
        quote_ttl_secs = config.quotes.ttl_secs,
        poll_interval_secs = config.triggers.poll_interval_secs,
        restore_on_startup = config.triggers.restore_on_startup,
        metrics_enabled = config.observability.metrics.enabled,
        "Configuration loaded"
    );
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for SIGTERM or SIGINT, then cancel `shutdown`.
///
/// # Panics
///
/// Panics if signal handlers cannot be installed; a process that cannot
/// respond to termination signals should fail at startup.
#[allow(clippy::expect_used)]
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown.cancelled() => return,
    }

    shutdown.cancel();
    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
