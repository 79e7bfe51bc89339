//! In-memory ledger.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{LedgerError, LedgerPort};
use crate::domain::conditional_orders::{Trigger, TriggerKey};
use crate::domain::shared::{Money, Quantity, Symbol, UserId};

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<UserId, Money>,
    holdings: HashMap<(UserId, Symbol), Quantity>,
    standing_amounts: HashMap<TriggerKey, Quantity>,
    triggers: HashMap<TriggerKey, Trigger>,
}

/// In-memory implementation of `LedgerPort`.
///
/// Every adjustment runs under one write lock, which makes the
/// read-check-write atomic. State is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts with a balance entry.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.state.read().balances.len()
    }
}

#[async_trait]
impl LedgerPort for InMemoryLedger {
    async fn get_balance(&self, user: &UserId) -> Result<Money, LedgerError> {
        Ok(self
            .state
            .read()
            .balances
            .get(user)
            .copied()
            .unwrap_or(Money::ZERO))
    }

    async fn adjust_balance(&self, user: &UserId, delta: Money) -> Result<Money, LedgerError> {
        let mut state = self.state.write();
        let current = state.balances.get(user).copied().unwrap_or(Money::ZERO);
        let next = current
            .checked_add(delta)
            .ok_or_else(|| LedgerError::Unavailable {
                message: format!("balance overflow for {user}"),
            })?;

        if next.is_negative() {
            return Err(LedgerError::InsufficientFunds {
                required: -delta,
                available: current,
            });
        }

        state.balances.insert(user.clone(), next);
        Ok(next)
    }

    async fn get_holding(&self, user: &UserId, symbol: &Symbol) -> Result<Quantity, LedgerError> {
        Ok(self
            .state
            .read()
            .holdings
            .get(&(user.clone(), symbol.clone()))
            .copied()
            .unwrap_or(Quantity::ZERO))
    }

    async fn adjust_holding(
        &self,
        user: &UserId,
        symbol: &Symbol,
        delta: i64,
    ) -> Result<Quantity, LedgerError> {
        let mut state = self.state.write();
        let key = (user.clone(), symbol.clone());
        let current = state.holdings.get(&key).copied().unwrap_or(Quantity::ZERO);

        let next = i128::from(current.value()) + i128::from(delta);
        if next < 0 {
            return Err(LedgerError::InsufficientHoldings {
                symbol: symbol.clone(),
                required: Quantity::new(delta.unsigned_abs()),
                available: current,
            });
        }
        let next = u64::try_from(next)
            .map(Quantity::new)
            .map_err(|_| LedgerError::Unavailable {
                message: format!("holding overflow for {user} {symbol}"),
            })?;

        if next.is_zero() {
            state.holdings.remove(&key);
        } else {
            state.holdings.insert(key, next);
        }
        Ok(next)
    }

    async fn get_standing_amount(&self, key: &TriggerKey) -> Result<Quantity, LedgerError> {
        Ok(self
            .state
            .read()
            .standing_amounts
            .get(key)
            .copied()
            .unwrap_or(Quantity::ZERO))
    }

    async fn set_standing_amount(
        &self,
        key: &TriggerKey,
        quantity: Quantity,
    ) -> Result<(), LedgerError> {
        self.state
            .write()
            .standing_amounts
            .insert(key.clone(), quantity);
        Ok(())
    }

    async fn delete_standing_amount(&self, key: &TriggerKey) -> Result<bool, LedgerError> {
        Ok(self.state.write().standing_amounts.remove(key).is_some())
    }

    async fn get_trigger(&self, key: &TriggerKey) -> Result<Option<Trigger>, LedgerError> {
        Ok(self.state.read().triggers.get(key).cloned())
    }

    async fn put_trigger(&self, trigger: Trigger) -> Result<(), LedgerError> {
        self.state
            .write()
            .triggers
            .insert(trigger.key.clone(), trigger);
        Ok(())
    }

    async fn delete_trigger(&self, key: &TriggerKey) -> Result<bool, LedgerError> {
        Ok(self.state.write().triggers.remove(key).is_some())
    }

    async fn list_triggers(&self) -> Result<Vec<Trigger>, LedgerError> {
        let mut triggers: Vec<Trigger> = self.state.read().triggers.values().cloned().collect();
        triggers.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(triggers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_staging::OrderSide;

    fn user() -> UserId {
        UserId::new("u1")
    }

    fn key(side: OrderSide) -> TriggerKey {
        TriggerKey::new(user(), Symbol::new("ABC"), side)
    }

    #[tokio::test]
    async fn unknown_accounts_read_as_zero() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.get_balance(&user()).await.unwrap(), Money::ZERO);
        assert_eq!(
            ledger.get_holding(&user(), &Symbol::new("ABC")).await.unwrap(),
            Quantity::ZERO
        );
        assert_eq!(ledger.account_count(), 0);
    }

    #[tokio::test]
    async fn adjust_balance_credits_and_debits() {
        let ledger = InMemoryLedger::new();
        assert_eq!(
            ledger.adjust_balance(&user(), Money::dollars(100)).await.unwrap(),
            Money::dollars(100)
        );
        assert_eq!(
            ledger.adjust_balance(&user(), Money::dollars(-40)).await.unwrap(),
            Money::dollars(60)
        );
        assert_eq!(ledger.account_count(), 1);
    }

    #[tokio::test]
    async fn overdraft_is_rejected_without_mutation() {
        let ledger = InMemoryLedger::new();
        ledger.adjust_balance(&user(), Money::dollars(50)).await.unwrap();

        let err = ledger
            .adjust_balance(&user(), Money::dollars(-51))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                required: Money::dollars(51),
                available: Money::dollars(50),
            }
        );
        assert_eq!(ledger.get_balance(&user()).await.unwrap(), Money::dollars(50));
    }

    #[tokio::test]
    async fn holdings_cannot_go_negative() {
        let ledger = InMemoryLedger::new();
        let abc = Symbol::new("ABC");
        ledger.adjust_holding(&user(), &abc, 5).await.unwrap();

        let err = ledger.adjust_holding(&user(), &abc, -6).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientHoldings { .. }));
        assert_eq!(
            ledger.get_holding(&user(), &abc).await.unwrap(),
            Quantity::new(5)
        );

        assert_eq!(
            ledger.adjust_holding(&user(), &abc, -5).await.unwrap(),
            Quantity::ZERO
        );
    }

    #[tokio::test]
    async fn standing_amounts_are_keyed_by_side() {
        let ledger = InMemoryLedger::new();
        ledger
            .set_standing_amount(&key(OrderSide::Buy), Quantity::new(3))
            .await
            .unwrap();

        assert_eq!(
            ledger.get_standing_amount(&key(OrderSide::Buy)).await.unwrap(),
            Quantity::new(3)
        );
        assert_eq!(
            ledger.get_standing_amount(&key(OrderSide::Sell)).await.unwrap(),
            Quantity::ZERO
        );
        assert!(ledger.delete_standing_amount(&key(OrderSide::Buy)).await.unwrap());
        assert!(!ledger.delete_standing_amount(&key(OrderSide::Buy)).await.unwrap());
    }

    #[tokio::test]
    async fn put_trigger_is_last_write_wins() {
        let ledger = InMemoryLedger::new();
        let k = key(OrderSide::Sell);
        ledger
            .put_trigger(Trigger::new(k.clone(), Money::dollars(10)).unwrap())
            .await
            .unwrap();
        ledger
            .put_trigger(Trigger::new(k.clone(), Money::dollars(12)).unwrap())
            .await
            .unwrap();

        let stored = ledger.get_trigger(&k).await.unwrap().unwrap();
        assert_eq!(stored.target_price, Money::dollars(12));
        assert_eq!(ledger.list_triggers().await.unwrap().len(), 1);

        assert!(ledger.delete_trigger(&k).await.unwrap());
        assert!(ledger.get_trigger(&k).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_triggers_is_sorted_by_key() {
        let ledger = InMemoryLedger::new();
        for (symbol, side) in [
            ("XYZ", OrderSide::Buy),
            ("ABC", OrderSide::Sell),
            ("ABC", OrderSide::Buy),
        ] {
            let k = TriggerKey::new(user(), Symbol::new(symbol), side);
            ledger
                .put_trigger(Trigger::new(k, Money::dollars(5)).unwrap())
                .await
                .unwrap();
        }

        let keys: Vec<(String, OrderSide)> = ledger
            .list_triggers()
            .await
            .unwrap()
            .into_iter()
            .map(|t| (t.key.symbol.as_str().to_string(), t.key.side))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("ABC".to_string(), OrderSide::Buy),
                ("ABC".to_string(), OrderSide::Sell),
                ("XYZ".to_string(), OrderSide::Buy),
            ]
        );
    }
}
