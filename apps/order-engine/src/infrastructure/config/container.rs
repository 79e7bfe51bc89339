//! Dependency Injection Container
//!
//! Manages creation and wiring of all application components.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{LedgerPort, QuoteSourcePort};
use crate::application::services::{TriggerMonitorConfig, TriggerMonitorService};
use crate::application::use_cases::TransactionCoordinator;
use crate::config::Config;
use crate::infrastructure::http::AppState;
use crate::infrastructure::persistence::InMemoryLedger;
use crate::infrastructure::quotes::{CachedQuoteSource, HttpQuoteSource, HttpQuoteSourceConfig};

/// Container wired with the production adapters.
pub type ProductionContainer = Container<InMemoryLedger, CachedQuoteSource<HttpQuoteSource>>;

/// Dependency injection container.
///
/// Holds the ports plus the coordinator and trigger monitor built on them.
/// Both services share one coordinator, so client requests and trigger
/// firings contend on the same per-(user, side) locks.
pub struct Container<L, Q>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    // Ports
    ledger: Arc<L>,
    quotes: Arc<Q>,

    // Services
    coordinator: Arc<TransactionCoordinator<L, Q>>,
    monitor: Arc<TriggerMonitorService<L, Q>>,
}

impl<L, Q> Container<L, Q>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    /// Create a new container with all dependencies.
    pub fn new(
        ledger: Arc<L>,
        quotes: Arc<Q>,
        monitor_config: TriggerMonitorConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let coordinator = Arc::new(TransactionCoordinator::new(
            Arc::clone(&ledger),
            Arc::clone(&quotes),
        ));
        let monitor = Arc::new(TriggerMonitorService::new(
            monitor_config,
            Arc::clone(&coordinator),
            shutdown,
        ));

        Self {
            ledger,
            quotes,
            coordinator,
            monitor,
        }
    }

    /// Get the ledger port.
    pub fn ledger(&self) -> Arc<L> {
        Arc::clone(&self.ledger)
    }

    /// Get the quote source port.
    pub fn quotes(&self) -> Arc<Q> {
        Arc::clone(&self.quotes)
    }

    /// Get the transaction coordinator.
    pub fn coordinator(&self) -> Arc<TransactionCoordinator<L, Q>> {
        Arc::clone(&self.coordinator)
    }

    /// Get the trigger monitor.
    pub fn monitor(&self) -> Arc<TriggerMonitorService<L, Q>> {
        Arc::clone(&self.monitor)
    }

    /// Build the HTTP state for the router.
    pub fn app_state(&self, version: impl Into<String>) -> AppState<L, Q> {
        AppState {
            coordinator: self.coordinator(),
            monitor: self.monitor(),
            version: version.into(),
        }
    }
}

impl ProductionContainer {
    /// Wire the in-memory ledger and the cached HTTP quote source from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(
        config: &Config,
        shutdown: CancellationToken,
    ) -> Result<Self, reqwest::Error> {
        let upstream = HttpQuoteSource::new(&HttpQuoteSourceConfig {
            base_url: config.quotes.base_url.clone(),
            timeout: config.quotes.request_timeout(),
        })?;
        let quotes = CachedQuoteSource::with_ttl(Arc::new(upstream), config.quotes.ttl());

        Ok(Self::new(
            Arc::new(InMemoryLedger::new()),
            Arc::new(quotes),
            TriggerMonitorConfig::from(&config.triggers),
            shutdown,
        ))
    }
}
