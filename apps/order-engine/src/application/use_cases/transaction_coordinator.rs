//! Transaction Coordinator Use Case
//!
//! Drives the two-phase protocol: stage, then commit or cancel.
//!
//! | Step   | Buy                         | Sell                          |
//! |--------|-----------------------------|-------------------------------|
//! | stage  | debit balance by cost       | debit holding by quantity     |
//! | commit | credit holding by quantity  | credit balance by proceeds    |
//! | cancel | credit balance by cost      | credit holding by quantity    |
//!
//! Each (user, side) pair owns an async lock around its pending order stack.
//! Reserve-and-push and pop-and-apply both run under that lock, so client
//! requests and trigger firings for the same key serialize, while other
//! users and the other side proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::application::dto::{AccountSummaryDto, PendingOrderDto};
use crate::application::ports::{LedgerPort, Quote, QuoteSourcePort};
use crate::domain::order_staging::{
    OrderSide, PendingOrder, PendingOrderStack, TradingError, size_by_amount, size_by_quantity,
};
use crate::domain::shared::{Money, Quantity, Symbol, UserId};
use crate::observability::{
    record_order_cancelled, record_order_committed, record_order_rejection, record_order_staged,
};

type StackKey = (UserId, OrderSide);
type SharedStack = Arc<Mutex<PendingOrderStack>>;

/// Use case for staging, committing and cancelling orders.
pub struct TransactionCoordinator<L, Q>
where
    L: LedgerPort,
    Q: QuoteSourcePort,
{
    ledger: Arc<L>,
    quotes: Arc<Q>,
    stacks: parking_lot::Mutex<HashMap<StackKey, SharedStack>>,
}

impl<L, Q> TransactionCoordinator<L, Q>
where
    L: LedgerPort,
    Q: QuoteSourcePort,
{
    /// Create a new `TransactionCoordinator`.
    pub fn new(ledger: Arc<L>, quotes: Arc<Q>) -> Self {
        Self {
            ledger,
            quotes,
            stacks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// The ledger this coordinator writes to.
    pub fn ledger(&self) -> Arc<L> {
        Arc::clone(&self.ledger)
    }

    // ------------------------------------------------------------------
    // Stage
    // ------------------------------------------------------------------

    /// Reserve funds for `floor(amount / price)` shares of `symbol`.
    pub async fn stage_buy(
        &self,
        user: &UserId,
        symbol: &Symbol,
        amount: Money,
    ) -> Result<PendingOrder, TradingError> {
        self.stage(OrderSide::Buy, user, symbol, amount).await
    }

    /// Reserve `floor(amount / price)` shares of `symbol` for sale.
    pub async fn stage_sell(
        &self,
        user: &UserId,
        symbol: &Symbol,
        amount: Money,
    ) -> Result<PendingOrder, TradingError> {
        self.stage(OrderSide::Sell, user, symbol, amount).await
    }

    /// Stage an order of `amount` dollars on `side`.
    pub async fn stage(
        &self,
        side: OrderSide,
        user: &UserId,
        symbol: &Symbol,
        amount: Money,
    ) -> Result<PendingOrder, TradingError> {
        let started = Instant::now();

        let result: Result<PendingOrder, TradingError> = async {
            if !amount.is_positive() {
                return Err(TradingError::invalid_quantity(format!(
                    "amount must be positive, got {amount}"
                )));
            }

            let quote = self.quote(symbol).await?;
            let sizing = size_by_amount(amount, quote.price)?;
            let order = PendingOrder::new(user.clone(), side, symbol.clone(), sizing);

            let stack = self.stack(user, side);
            let mut guard = stack.lock().await;
            let reserved = self.reserve(&order).await;
            if reserved.is_ok() {
                guard.push(order.clone());
            }
            self.prune_if_empty(user, side, &stack, guard.is_empty());
            reserved.map(|()| order)
        }
        .await;

        match &result {
            Ok(order) => {
                record_order_staged(side.as_str(), started.elapsed().as_secs_f64());
                tracing::info!(
                    user = %user,
                    side = %side,
                    symbol = %symbol,
                    quantity = %order.quantity,
                    price = %order.price,
                    amount = %order.amount,
                    order_id = %order.id,
                    "Order staged"
                );
            }
            Err(e) => Self::rejected("stage", side, user, e),
        }
        result
    }

    // ------------------------------------------------------------------
    // Commit / Cancel
    // ------------------------------------------------------------------

    /// Commit the most recently staged buy.
    pub async fn commit_buy(&self, user: &UserId) -> Result<PendingOrder, TradingError> {
        self.commit(OrderSide::Buy, user).await
    }

    /// Commit the most recently staged sell.
    pub async fn commit_sell(&self, user: &UserId) -> Result<PendingOrder, TradingError> {
        self.commit(OrderSide::Sell, user).await
    }

    /// Cancel the most recently staged buy, restoring its cost.
    pub async fn cancel_buy(&self, user: &UserId) -> Result<PendingOrder, TradingError> {
        self.cancel(OrderSide::Buy, user).await
    }

    /// Cancel the most recently staged sell, restoring its shares.
    pub async fn cancel_sell(&self, user: &UserId) -> Result<PendingOrder, TradingError> {
        self.cancel(OrderSide::Sell, user).await
    }

    /// Pop the top of the `side` stack and deliver it.
    ///
    /// If delivery fails the order goes back on the stack.
    pub async fn commit(
        &self,
        side: OrderSide,
        user: &UserId,
    ) -> Result<PendingOrder, TradingError> {
        let result = self
            .pop_and(side, user, |order| async move {
                self.deliver(&order).await?;
                Ok::<_, TradingError>(order)
            })
            .await;

        match &result {
            Ok(order) => {
                record_order_committed(side.as_str());
                tracing::info!(
                    user = %user,
                    side = %side,
                    symbol = %order.symbol,
                    quantity = %order.quantity,
                    amount = %order.amount,
                    order_id = %order.id,
                    "Order committed"
                );
            }
            Err(e) => Self::rejected("commit", side, user, e),
        }
        result
    }

    /// Pop the top of the `side` stack and reverse its reservation.
    ///
    /// If the reversal fails the order goes back on the stack.
    pub async fn cancel(
        &self,
        side: OrderSide,
        user: &UserId,
    ) -> Result<PendingOrder, TradingError> {
        let result = self
            .pop_and(side, user, |order| async move {
                self.release(&order).await?;
                Ok::<_, TradingError>(order)
            })
            .await;

        match &result {
            Ok(order) => {
                record_order_cancelled(side.as_str());
                tracing::info!(
                    user = %user,
                    side = %side,
                    symbol = %order.symbol,
                    quantity = %order.quantity,
                    amount = %order.amount,
                    order_id = %order.id,
                    "Order cancelled"
                );
            }
            Err(e) => Self::rejected("cancel", side, user, e),
        }
        result
    }

    // ------------------------------------------------------------------
    // Immediate execution (trigger firing)
    // ------------------------------------------------------------------

    /// Stage `quantity` shares at the current price and commit them at once.
    ///
    /// The (user, side) lock is held across both steps, so the commit
    /// consumes exactly this order and never one staged by a client.
    /// Client-staged orders on the stack are left untouched.
    pub async fn execute_immediately(
        &self,
        side: OrderSide,
        user: &UserId,
        symbol: &Symbol,
        quantity: Quantity,
    ) -> Result<PendingOrder, TradingError> {
        let result: Result<PendingOrder, TradingError> = async {
            let quote = self.quote(symbol).await?;
            let sizing = size_by_quantity(quantity, quote.price)?;
            let order = PendingOrder::new(user.clone(), side, symbol.clone(), sizing);

            let stack = self.stack(user, side);
            let guard = stack.lock().await;
            let executed = self.reserve_and_deliver(&order).await;
            self.prune_if_empty(user, side, &stack, guard.is_empty());
            executed.map(|()| order)
        }
        .await;

        match &result {
            Ok(order) => {
                record_order_committed(side.as_str());
                tracing::info!(
                    user = %user,
                    side = %side,
                    symbol = %symbol,
                    quantity = %order.quantity,
                    price = %order.price,
                    amount = %order.amount,
                    order_id = %order.id,
                    "Order executed"
                );
            }
            Err(e) => Self::rejected("execute", side, user, e),
        }
        result
    }

    // ------------------------------------------------------------------
    // Funds and queries
    // ------------------------------------------------------------------

    /// Deposit `amount` into the user's balance; returns the new balance.
    pub async fn add_funds(&self, user: &UserId, amount: Money) -> Result<Money, TradingError> {
        if !amount.is_positive() {
            return Err(TradingError::invalid_amount(format!(
                "deposit must be positive, got {amount}"
            )));
        }

        let balance = self.ledger.adjust_balance(user, amount).await?;
        tracing::info!(user = %user, amount = %amount, balance = %balance, "Funds added");
        Ok(balance)
    }

    /// Current (possibly cached) quote for `symbol`.
    ///
    /// A non-positive price is reported as `QuoteUnavailable`.
    pub async fn quote(&self, symbol: &Symbol) -> Result<Quote, TradingError> {
        let quote = self.quotes.get_quote(symbol).await?;
        if !quote.price.is_positive() {
            return Err(TradingError::QuoteUnavailable {
                symbol: symbol.clone(),
                message: format!("untradeable price {}", quote.price),
            });
        }
        Ok(quote)
    }

    /// Available balance.
    pub async fn balance(&self, user: &UserId) -> Result<Money, TradingError> {
        Ok(self.ledger.get_balance(user).await?)
    }

    /// Shares owned, excluding shares reserved by staged sells.
    pub async fn holding(&self, user: &UserId, symbol: &Symbol) -> Result<Quantity, TradingError> {
        Ok(self.ledger.get_holding(user, symbol).await?)
    }

    /// Staged orders on `side`, most recent first.
    pub async fn pending_orders(&self, user: &UserId, side: OrderSide) -> Vec<PendingOrder> {
        let existing = self.stacks.lock().get(&(user.clone(), side)).cloned();
        match existing {
            Some(stack) => stack.lock().await.iter_recent_first().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Balance plus both pending stacks.
    pub async fn account_summary(&self, user: &UserId) -> Result<AccountSummaryDto, TradingError> {
        let balance = self.balance(user).await?;
        let to_dtos =
            |orders: Vec<PendingOrder>| orders.iter().map(PendingOrderDto::from).collect();

        Ok(AccountSummaryDto {
            user_id: user.to_string(),
            balance,
            pending_buys: to_dtos(self.pending_orders(user, OrderSide::Buy).await),
            pending_sells: to_dtos(self.pending_orders(user, OrderSide::Sell).await),
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn stack(&self, user: &UserId, side: OrderSide) -> SharedStack {
        let mut stacks = self.stacks.lock();
        Arc::clone(stacks.entry((user.clone(), side)).or_default())
    }

    /// Pop under the key lock, run `apply`, and push the order back if it fails.
    async fn pop_and<F, Fut>(
        &self,
        side: OrderSide,
        user: &UserId,
        apply: F,
    ) -> Result<PendingOrder, TradingError>
    where
        F: FnOnce(PendingOrder) -> Fut,
        Fut: Future<Output = Result<PendingOrder, TradingError>>,
    {
        let stack = self.stack(user, side);
        let mut guard = stack.lock().await;
        let result = match guard.pop() {
            None => Err(TradingError::NoPendingOrder { side }),
            Some(order) => match apply(order.clone()).await {
                Ok(done) => Ok(done),
                Err(e) => {
                    guard.push(order);
                    Err(e)
                }
            },
        };
        self.prune_if_empty(user, side, &stack, guard.is_empty());
        result
    }

    /// Drop the map entry for an emptied stack no other request holds.
    ///
    /// Call with the stack lock held. Handles are only cloned under the map
    /// lock, so a strong count of two (map and caller) means nobody else can
    /// be waiting on it.
    fn prune_if_empty(
        &self,
        user: &UserId,
        side: OrderSide,
        stack: &SharedStack,
        is_empty: bool,
    ) {
        if !is_empty {
            return;
        }
        let mut stacks = self.stacks.lock();
        let key = (user.clone(), side);
        let ours = stacks
            .get(&key)
            .is_some_and(|entry| Arc::ptr_eq(entry, stack));
        if ours && Arc::strong_count(stack) == 2 {
            stacks.remove(&key);
        }
    }

    /// Reserve then deliver in one step, undoing the reservation if delivery fails.
    async fn reserve_and_deliver(&self, order: &PendingOrder) -> Result<(), TradingError> {
        self.reserve(order).await?;
        if let Err(e) = self.deliver(order).await {
            if let Err(undo) = self.release(order).await {
                tracing::error!(
                    user = %order.user,
                    side = %order.side,
                    symbol = %order.symbol,
                    error = %undo,
                    "Failed to release reservation after delivery failure"
                );
            }
            return Err(e);
        }
        Ok(())
    }

    /// Take the stage-time reservation from the ledger.
    async fn reserve(&self, order: &PendingOrder) -> Result<(), TradingError> {
        match order.side {
            OrderSide::Buy => {
                self.ledger
                    .adjust_balance(&order.user, -order.amount)
                    .await?;
            }
            OrderSide::Sell => {
                self.ledger
                    .adjust_holding(&order.user, &order.symbol, order.quantity.as_debit())
                    .await?;
            }
        }
        Ok(())
    }

    /// Deliver what the reservation paid for.
    async fn deliver(&self, order: &PendingOrder) -> Result<(), TradingError> {
        match order.side {
            OrderSide::Buy => {
                self.ledger
                    .adjust_holding(&order.user, &order.symbol, order.quantity.as_credit())
                    .await?;
            }
            OrderSide::Sell => {
                self.ledger.adjust_balance(&order.user, order.amount).await?;
            }
        }
        Ok(())
    }

    /// Return the reservation to its owner.
    async fn release(&self, order: &PendingOrder) -> Result<(), TradingError> {
        match order.side {
            OrderSide::Buy => {
                self.ledger.adjust_balance(&order.user, order.amount).await?;
            }
            OrderSide::Sell => {
                self.ledger
                    .adjust_holding(&order.user, &order.symbol, order.quantity.as_credit())
                    .await?;
            }
        }
        Ok(())
    }

    fn rejected(operation: &'static str, side: OrderSide, user: &UserId, error: &TradingError) {
        record_order_rejection(operation, error.code());
        if error.is_transient() {
            tracing::warn!(user = %user, side = %side, operation, error = %error, "Operation failed");
        } else {
            tracing::info!(user = %user, side = %side, operation, error = %error, "Operation rejected");
        }
    }
}
