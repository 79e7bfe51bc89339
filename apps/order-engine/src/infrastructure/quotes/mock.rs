//! Mock quote source for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{Quote, QuoteError, QuoteSourcePort};
use crate::domain::shared::{Money, Symbol};

/// Scriptable quote source.
///
/// Prices are set per symbol; unknown symbols fail with `SymbolNotFound`.
#[derive(Debug, Default)]
pub struct MockQuoteSource {
    prices: RwLock<HashMap<Symbol, Money>>,
    failing: AtomicBool,
    latency: RwLock<Option<Duration>>,
    fetches: AtomicUsize,
}

impl MockQuoteSource {
    /// Create a new mock with no prices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the price for a symbol.
    pub fn set_price(&self, symbol: &str, price: Money) {
        self.prices.write().insert(Symbol::new(symbol), price);
    }

    /// Make every fetch fail with `Unavailable` until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every fetch by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = Some(latency);
    }

    /// Number of fetches served so far, successful or not.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSourcePort for MockQuoteSource {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(QuoteError::Unavailable {
                symbol: symbol.clone(),
                message: "mock quote source failing".to_string(),
            });
        }

        let price = self.prices.read().get(symbol).copied();
        price
            .map(|price| Quote::new(symbol.clone(), price))
            .ok_or_else(|| QuoteError::SymbolNotFound {
                symbol: symbol.clone(),
            })
    }
}
