//! TTL quote cache.
//!
//! Wraps any `QuoteSourcePort`. Each symbol has its own async slot: callers
//! for the same symbol queue on the slot, so a stale entry is refreshed by
//! exactly one upstream fetch and the queued callers read the fresh value.
//! Different symbols never contend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::application::ports::{Quote, QuoteError, QuoteSourcePort};
use crate::domain::shared::Symbol;
use crate::observability::record_quote_lookup;

/// Default freshness window.
pub const DEFAULT_QUOTE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedQuote {
    quote: Quote,
    fetched_at: Instant,
}

type Slot = Arc<Mutex<Option<CachedQuote>>>;

/// Quote source with a per-symbol freshness window.
#[derive(Debug)]
pub struct CachedQuoteSource<S: QuoteSourcePort> {
    inner: Arc<S>,
    ttl: Duration,
    slots: parking_lot::Mutex<HashMap<Symbol, Slot>>,
}

impl<S: QuoteSourcePort> CachedQuoteSource<S> {
    /// Wrap `inner` with the default 60 s TTL.
    pub fn new(inner: Arc<S>) -> Self {
        Self::with_ttl(inner, DEFAULT_QUOTE_TTL)
    }

    /// Wrap `inner` with a custom TTL.
    pub fn with_ttl(inner: Arc<S>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slots: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// The freshness window.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop the cached value for `symbol`, forcing the next lookup upstream.
    pub async fn invalidate(&self, symbol: &Symbol) {
        let slot = self.slots.lock().get(symbol).cloned();
        if let Some(slot) = slot {
            *slot.lock().await = None;
        }
    }

    fn slot(&self, symbol: &Symbol) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(symbol.clone()).or_default())
    }
}

#[async_trait]
impl<S: QuoteSourcePort> QuoteSourcePort for CachedQuoteSource<S> {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        let slot = self.slot(symbol);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref()
            && cached.fetched_at.elapsed() < self.ttl
        {
            record_quote_lookup("hit");
            return Ok(cached.quote.clone());
        }

        record_quote_lookup("miss");
        let quote = self.inner.get_quote(symbol).await?;
        *entry = Some(CachedQuote {
            quote: quote.clone(),
            fetched_at: Instant::now(),
        });

        tracing::debug!(symbol = %symbol, price = %quote.price, "Quote cache refreshed");
        Ok(quote)
    }
}
