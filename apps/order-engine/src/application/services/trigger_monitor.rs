//! Trigger Monitor Service
//!
//! Owns one background watcher per armed trigger. Each watcher polls the
//! quote for its symbol and, when the target is crossed, executes the
//! standing amount through the [`TransactionCoordinator`].
//!
//! Watcher lifecycle: `Armed -> Firing -> Cancelled` on a successful fire,
//! `Firing -> Armed` on a failed one, and `Armed -> Cancelled` on explicit
//! cancel or shutdown. Every watcher holds a child of the service's root
//! [`CancellationToken`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{LedgerPort, QuoteSourcePort};
use crate::application::use_cases::TransactionCoordinator;
use crate::config::TriggersConfig;
use crate::domain::conditional_orders::{Trigger, TriggerKey, TriggerState};
use crate::domain::order_staging::{OrderSide, TradingError};
use crate::domain::shared::{Money, Quantity, Symbol, UserId};
use crate::observability::{record_trigger_fire, set_active_watchers};

/// Configuration for the trigger monitor.
#[derive(Debug, Clone)]
pub struct TriggerMonitorConfig {
    /// Time between price polls for each watcher.
    pub poll_interval: Duration,
    /// Capacity of the fire report channel.
    pub report_capacity: usize,
}

impl Default for TriggerMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            report_capacity: 256,
        }
    }
}

impl From<&TriggersConfig> for TriggerMonitorConfig {
    fn from(config: &TriggersConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            ..Self::default()
        }
    }
}

/// What happened when a trigger's price was crossed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// The standing amount was bought or sold.
    Executed {
        /// Shares traded.
        quantity: Quantity,
        /// Cost or proceeds.
        amount: Money,
    },
    /// The attempt failed; the trigger stays armed.
    Failed {
        /// Error code of the failure.
        code: &'static str,
        /// Error details.
        message: String,
    },
}

/// Published for every firing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireReport {
    /// Trigger that fired.
    pub key: TriggerKey,
    /// Price that crossed the target.
    pub price: Money,
    /// Result of the attempt.
    pub outcome: FireOutcome,
}

impl FireReport {
    /// Whether the standing amount was executed.
    #[must_use]
    pub const fn is_executed(&self) -> bool {
        matches!(self.outcome, FireOutcome::Executed { .. })
    }
}

struct WatcherHandle {
    token: CancellationToken,
    generation: u64,
    state: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

type Registry = HashMap<TriggerKey, WatcherHandle>;

struct MonitorInner<L, Q>
where
    L: LedgerPort,
    Q: QuoteSourcePort,
{
    config: TriggerMonitorConfig,
    coordinator: Arc<TransactionCoordinator<L, Q>>,
    ledger: Arc<L>,
    /// Registration, cancellation and post-fire teardown all hold this lock.
    watchers: Mutex<Registry>,
    next_generation: AtomicU64,
    shutdown: CancellationToken,
    report_tx: broadcast::Sender<FireReport>,
}

enum PollResult {
    Waiting,
    Fired,
    Stopped,
}

/// Trigger registry plus the watchers that enforce it.
pub struct TriggerMonitorService<L, Q>
where
    L: LedgerPort,
    Q: QuoteSourcePort,
{
    inner: Arc<MonitorInner<L, Q>>,
}

impl<L, Q> TriggerMonitorService<L, Q>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    /// Create a new trigger monitor.
    ///
    /// Cancelling `shutdown` stops every watcher.
    #[must_use]
    pub fn new(
        config: TriggerMonitorConfig,
        coordinator: Arc<TransactionCoordinator<L, Q>>,
        shutdown: CancellationToken,
    ) -> Self {
        let (report_tx, _) = broadcast::channel(config.report_capacity.max(1));
        let ledger = coordinator.ledger();

        Self {
            inner: Arc::new(MonitorInner {
                config,
                coordinator,
                ledger,
                watchers: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                shutdown,
                report_tx,
            }),
        }
    }

    /// Set (or replace) the target price for a conditional order.
    ///
    /// A live watcher picks up the new target on its next poll; otherwise
    /// a new watcher is spawned.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a non-positive price, or
    /// `LedgerUnavailable` if the trigger cannot be stored.
    pub async fn set_trigger(
        &self,
        user: &UserId,
        symbol: &Symbol,
        side: OrderSide,
        target_price: Money,
    ) -> Result<Trigger, TradingError> {
        let key = TriggerKey::new(user.clone(), symbol.clone(), side);
        let trigger = Trigger::new(key.clone(), target_price)?;

        let mut watchers = self.inner.watchers.lock().await;
        self.inner.ledger.put_trigger(trigger.clone()).await?;

        let live = watchers
            .get(&key)
            .is_some_and(|handle| !handle.token.is_cancelled());
        if !live {
            Arc::clone(&self.inner).spawn_watcher(&mut watchers, key.clone());
        }
        drop(watchers);

        tracing::info!(trigger = %key, target_price = %target_price, "Trigger set");
        Ok(trigger)
    }

    /// Add `quantity` shares to the standing amount traded when the trigger
    /// fires. Works whether or not the trigger exists yet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for zero or an overflowing total, or
    /// `LedgerUnavailable`.
    pub async fn set_standing_amount(
        &self,
        user: &UserId,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Quantity,
    ) -> Result<Quantity, TradingError> {
        if quantity.is_zero() {
            return Err(TradingError::invalid_quantity(
                "standing amount must be at least one share",
            ));
        }
        let key = TriggerKey::new(user.clone(), symbol.clone(), side);

        let _watchers = self.inner.watchers.lock().await;
        let current = self.inner.ledger.get_standing_amount(&key).await?;
        let total = current
            .checked_add(quantity)
            .filter(|total| *total <= Quantity::MAX_ORDER)
            .ok_or_else(|| {
                TradingError::invalid_quantity(format!(
                    "standing amount would exceed {}",
                    Quantity::MAX_ORDER
                ))
            })?;
        self.inner.ledger.set_standing_amount(&key, total).await?;

        tracing::info!(trigger = %key, added = %quantity, total = %total, "Standing amount set");
        Ok(total)
    }

    /// Delete a trigger and its standing amount, and stop its watcher.
    ///
    /// A watcher already executing is allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns `TriggerNotFound` when neither a trigger nor a standing
    /// amount exists for the key, or `LedgerUnavailable`.
    pub async fn cancel_trigger(
        &self,
        user: &UserId,
        symbol: &Symbol,
        side: OrderSide,
    ) -> Result<(), TradingError> {
        let key = TriggerKey::new(user.clone(), symbol.clone(), side);

        let mut watchers = self.inner.watchers.lock().await;
        let had_trigger = self.inner.ledger.delete_trigger(&key).await?;
        let had_amount = self.inner.ledger.delete_standing_amount(&key).await?;

        if let Some(handle) = watchers.remove(&key) {
            handle.token.cancel();
            set_active_watchers(watchers.len());
        }
        drop(watchers);

        if !had_trigger && !had_amount {
            return Err(TradingError::TriggerNotFound {
                symbol: symbol.clone(),
                side,
            });
        }

        tracing::info!(trigger = %key, "Trigger cancelled");
        Ok(())
    }

    /// Spawn a watcher for every trigger stored in the ledger.
    ///
    /// Returns the number of watchers started.
    ///
    /// # Errors
    ///
    /// Returns `LedgerUnavailable` if the triggers cannot be listed.
    pub async fn restore(&self) -> Result<usize, TradingError> {
        let triggers = self.inner.ledger.list_triggers().await?;

        let mut watchers = self.inner.watchers.lock().await;
        let mut started = 0;
        for trigger in triggers {
            if !watchers.contains_key(&trigger.key) {
                Arc::clone(&self.inner).spawn_watcher(&mut watchers, trigger.key);
                started += 1;
            }
        }
        drop(watchers);

        tracing::info!(restored = started, "Trigger watchers restored");
        Ok(started)
    }

    /// Stop every watcher and wait for them to exit.
    ///
    /// Stored triggers are kept so [`Self::restore`] can re-arm them.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let handles: Vec<WatcherHandle> = {
            let mut watchers = self.inner.watchers.lock().await;
            let drained = watchers.drain().map(|(_, handle)| handle).collect();
            set_active_watchers(0);
            drained
        };

        let count = handles.len();
        futures::future::join_all(handles.into_iter().map(|handle| handle.task)).await;
        tracing::info!(stopped = count, "Trigger monitor shut down");
    }

    /// Subscribe to fire reports.
    #[must_use]
    pub fn fire_updates(&self) -> broadcast::Receiver<FireReport> {
        self.inner.report_tx.subscribe()
    }

    /// Current watcher state for `key`; `Cancelled` when none is running.
    pub async fn trigger_state(&self, key: &TriggerKey) -> TriggerState {
        self.inner
            .watchers
            .lock()
            .await
            .get(key)
            .map_or(TriggerState::Cancelled, |handle| {
                TriggerState::from_u8(handle.state.load(Ordering::SeqCst))
            })
    }

    /// Number of registered watchers.
    pub async fn active_watchers(&self) -> usize {
        self.inner.watchers.lock().await.len()
    }
}

impl<L, Q> MonitorInner<L, Q>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    /// Caller must hold the registry lock.
    fn spawn_watcher(self: Arc<Self>, watchers: &mut Registry, key: TriggerKey) {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let token = self.shutdown.child_token();
        let state = Arc::new(AtomicU8::new(TriggerState::Armed.as_u8()));

        let task = tokio::spawn(Arc::clone(&self).run_watcher(
            key.clone(),
            generation,
            token.clone(),
            Arc::clone(&state),
        ));

        if let Some(previous) = watchers.insert(
            key.clone(),
            WatcherHandle {
                token,
                generation,
                state,
                task,
            },
        ) {
            previous.token.cancel();
        }
        set_active_watchers(watchers.len());
        tracing::debug!(trigger = %key, generation, "Watcher started");
    }

    async fn run_watcher(
        self: Arc<Self>,
        key: TriggerKey,
        generation: u64,
        token: CancellationToken,
        state: Arc<AtomicU8>,
    ) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::debug!(trigger = %key, "Watcher cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.poll_once(&key, generation, &token, &state).await {
                        PollResult::Waiting => {}
                        PollResult::Fired | PollResult::Stopped => break,
                    }
                }
            }
        }

        state.store(TriggerState::Cancelled.as_u8(), Ordering::SeqCst);
        self.retire(&key, generation).await;
    }

    async fn poll_once(
        &self,
        key: &TriggerKey,
        generation: u64,
        token: &CancellationToken,
        state: &AtomicU8,
    ) -> PollResult {
        // 1. Re-read the target so a re-set takes effect
        let trigger = match self.ledger.get_trigger(key).await {
            Ok(Some(trigger)) => trigger,
            Ok(None) => {
                tracing::debug!(trigger = %key, "Trigger no longer stored, stopping watcher");
                return PollResult::Stopped;
            }
            Err(e) => {
                tracing::warn!(trigger = %key, error = %e, "Failed to read trigger");
                return PollResult::Waiting;
            }
        };

        // 2. Sample the price
        let price = match self.coordinator.quote(&key.symbol).await {
            Ok(quote) => quote.price,
            Err(e) => {
                tracing::warn!(trigger = %key, error = %e, "Quote unavailable, staying armed");
                return PollResult::Waiting;
            }
        };

        if !trigger.is_crossed_by(price) {
            tracing::trace!(trigger = %key, price = %price, target = %trigger.target_price, "Not crossed");
            return PollResult::Waiting;
        }

        // 3. Claim the firing unless cancelled meanwhile
        if token.is_cancelled() || !transition(state, TriggerState::Armed, TriggerState::Firing) {
            return PollResult::Stopped;
        }

        tracing::info!(trigger = %key, price = %price, target = %trigger.target_price, "Trigger crossed");

        // 4. Execute the standing amount
        let result = match self.ledger.get_standing_amount(key).await {
            Ok(quantity) if quantity.is_zero() => Err(TradingError::invalid_quantity(
                "no standing amount set for trigger",
            )),
            Ok(quantity) => {
                self.coordinator
                    .execute_immediately(key.side, &key.user, &key.symbol, quantity)
                    .await
            }
            Err(e) => Err(e.into()),
        };

        // 5. Tear down on success, re-arm on failure
        match result {
            Ok(order) => {
                record_trigger_fire(key.side.as_str(), "executed");
                let rearmed = self
                    .settle_fired(key, generation, &trigger, order.quantity)
                    .await;
                if rearmed {
                    transition(state, TriggerState::Firing, TriggerState::Armed);
                } else {
                    state.store(TriggerState::Cancelled.as_u8(), Ordering::SeqCst);
                }
                self.publish(FireReport {
                    key: key.clone(),
                    price,
                    outcome: FireOutcome::Executed {
                        quantity: order.quantity,
                        amount: order.amount,
                    },
                });
                if rearmed {
                    PollResult::Waiting
                } else {
                    PollResult::Fired
                }
            }
            Err(e) => {
                record_trigger_fire(key.side.as_str(), "failed");
                tracing::warn!(
                    trigger = %key,
                    price = %price,
                    code = e.code(),
                    error = %e,
                    "Trigger firing failed, re-arming"
                );
                transition(state, TriggerState::Firing, TriggerState::Armed);
                self.publish(FireReport {
                    key: key.clone(),
                    price,
                    outcome: FireOutcome::Failed {
                        code: e.code(),
                        message: e.to_string(),
                    },
                });
                PollResult::Waiting
            }
        }
    }

    /// Remove the registry entry if it still belongs to `generation`.
    async fn retire(&self, key: &TriggerKey, generation: u64) {
        let mut watchers = self.watchers.lock().await;
        let owned = watchers
            .get(key)
            .is_some_and(|handle| handle.generation == generation);
        if owned {
            watchers.remove(key);
            set_active_watchers(watchers.len());
        }
    }

    /// Consume what a successful firing used, keeping anything written since.
    ///
    /// The standing amount is reduced by `executed` rather than cleared. The
    /// stored trigger is deleted only if it is still the one that fired; a
    /// target re-set mid-firing keeps this watcher registered and the result
    /// is `true`. If the watcher was cancelled mid-firing, the cancel already
    /// removed both records and anything stored now belongs to a newer
    /// registration, so nothing is touched.
    async fn settle_fired(
        &self,
        key: &TriggerKey,
        generation: u64,
        fired: &Trigger,
        executed: Quantity,
    ) -> bool {
        let mut watchers = self.watchers.lock().await;
        let owned = watchers
            .get(key)
            .is_some_and(|handle| handle.generation == generation);
        if !owned {
            return false;
        }

        match self.ledger.get_standing_amount(key).await {
            Ok(current) => {
                let remaining = current.saturating_sub(executed);
                let updated = if remaining.is_zero() {
                    self.ledger.delete_standing_amount(key).await.map(|_| ())
                } else {
                    self.ledger.set_standing_amount(key, remaining).await
                };
                if let Err(e) = updated {
                    tracing::error!(trigger = %key, error = %e, "Failed to update standing amount");
                }
            }
            Err(e) => {
                tracing::error!(trigger = %key, error = %e, "Failed to read standing amount");
            }
        }

        let rearm = match self.ledger.get_trigger(key).await {
            Ok(Some(current)) if current != *fired => {
                tracing::info!(
                    trigger = %key,
                    target_price = %current.target_price,
                    "Trigger re-set during firing, staying armed"
                );
                true
            }
            Ok(Some(_)) => {
                if let Err(e) = self.ledger.delete_trigger(key).await {
                    tracing::error!(trigger = %key, error = %e, "Failed to delete fired trigger");
                }
                false
            }
            Ok(None) => false,
            Err(e) => {
                tracing::error!(trigger = %key, error = %e, "Failed to read trigger after firing");
                false
            }
        };

        if !rearm {
            watchers.remove(key);
            set_active_watchers(watchers.len());
        }
        rearm
    }

    fn publish(&self, report: FireReport) {
        // No subscribers is fine
        let _ = self.report_tx.send(report);
    }
}

fn transition(state: &AtomicU8, from: TriggerState, to: TriggerState) -> bool {
    debug_assert!(from.can_transition_to(to));
    state
        .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}
