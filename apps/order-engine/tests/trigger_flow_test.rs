//! Trigger Flow Integration Tests
//!
//! Conditional orders set over HTTP and executed by the trigger monitor.
//! Time is paused so poll intervals elapse instantly.
//!
//! Run with: `cargo test -p order-engine --test trigger_flow_test`

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use order_engine::{
    Container, FireOutcome, FireReport, InMemoryLedger, MockQuoteSource, Money, OrderSide,
    Quantity, Symbol, TriggerKey, TriggerMonitorConfig, TriggerState, UserId, create_router,
};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const POLL: Duration = Duration::from_secs(5);

// =============================================================================
// Fixtures
// =============================================================================

type TestContainer = Container<InMemoryLedger, MockQuoteSource>;

fn container() -> TestContainer {
    Container::new(
        Arc::new(InMemoryLedger::new()),
        Arc::new(MockQuoteSource::new()),
        TriggerMonitorConfig {
            poll_interval: POLL,
            ..TriggerMonitorConfig::default()
        },
        CancellationToken::new(),
    )
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn next_report(rx: &mut broadcast::Receiver<FireReport>) -> FireReport {
    tokio::time::timeout(POLL * 3, rx.recv())
        .await
        .expect("report within three polls")
        .expect("channel open")
}

async fn fund_and_buy(
    container: &TestContainer,
    user: &UserId,
    symbol: &str,
    price: i64,
    shares: i64,
) {
    let coordinator = container.coordinator();
    container.quotes().set_price(symbol, Money::dollars(price));
    coordinator
        .add_funds(user, Money::dollars(price * shares))
        .await
        .unwrap();
    coordinator
        .stage(
            OrderSide::Buy,
            user,
            &Symbol::new(symbol),
            Money::dollars(price * shares),
        )
        .await
        .unwrap();
    coordinator.commit(OrderSide::Buy, user).await.unwrap();
}

// =============================================================================
// Sell trigger over HTTP
// =============================================================================

#[tokio::test(start_paused = true)]
async fn sell_trigger_set_over_http_executes_on_rise() {
    let container = container();
    let app = create_router(container.app_state("test"));
    let monitor = container.monitor();
    let alice = UserId::new("alice");
    let abc = Symbol::new("ABC");

    fund_and_buy(&container, &alice, "ABC", 10, 20).await;
    let mut rx = monitor.fire_updates();

    let (status, body) = post_json(
        &app,
        "/set_sell_amount",
        json!({ "user_id": "alice", "symbol": "abc", "quantity": 8 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["side"], "SELL");

    let (status, body) = post_json(
        &app,
        "/set_sell_trigger",
        json!({ "user_id": "alice", "symbol": "abc", "price": "15" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "ARMED");

    // Below target: nothing happens
    tokio::time::sleep(POLL * 2).await;
    assert!(rx.try_recv().is_err());

    container.quotes().set_price("ABC", Money::dollars(16));
    let report = next_report(&mut rx).await;
    assert_eq!(
        report.outcome,
        FireOutcome::Executed {
            quantity: Quantity::new(8),
            amount: Money::dollars(128),
        }
    );

    let coordinator = container.coordinator();
    assert_eq!(coordinator.balance(&alice).await.unwrap(), Money::dollars(128));
    assert_eq!(
        coordinator.holding(&alice, &abc).await.unwrap(),
        Quantity::new(12)
    );

    // The trigger is consumed
    let key = TriggerKey::new(alice, abc, OrderSide::Sell);
    assert_eq!(monitor.trigger_state(&key).await, TriggerState::Cancelled);
    let (status, body) = post_json(
        &app,
        "/cancel_set_sell",
        json!({ "user_id": "alice", "symbol": "ABC" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TRIGGER_NOT_FOUND");
}

// =============================================================================
// Failed firings
// =============================================================================

#[tokio::test(start_paused = true)]
async fn buy_trigger_retries_until_funds_arrive() {
    let container = container();
    let monitor = container.monitor();
    let coordinator = container.coordinator();
    let bob = UserId::new("bob");
    let xyz = Symbol::new("XYZ");

    container.quotes().set_price("XYZ", Money::dollars(40));
    coordinator.add_funds(&bob, Money::dollars(50)).await.unwrap();
    let mut rx = monitor.fire_updates();

    monitor
        .set_standing_amount(&bob, &xyz, OrderSide::Buy, Quantity::new(2))
        .await
        .unwrap();
    monitor
        .set_trigger(&bob, &xyz, OrderSide::Buy, Money::dollars(45))
        .await
        .unwrap();

    let report = next_report(&mut rx).await;
    assert!(matches!(
        report.outcome,
        FireOutcome::Failed { code: "INSUFFICIENT_FUNDS", .. }
    ));
    let key = TriggerKey::new(bob.clone(), xyz.clone(), OrderSide::Buy);
    assert_eq!(monitor.trigger_state(&key).await, TriggerState::Armed);
    assert_eq!(coordinator.balance(&bob).await.unwrap(), Money::dollars(50));

    coordinator.add_funds(&bob, Money::dollars(50)).await.unwrap();
    let report = next_report(&mut rx).await;
    assert!(report.is_executed());
    assert_eq!(coordinator.balance(&bob).await.unwrap(), Money::dollars(20));
    assert_eq!(coordinator.holding(&bob, &xyz).await.unwrap(), Quantity::new(2));
    assert_eq!(monitor.active_watchers().await, 0);
}

#[tokio::test(start_paused = true)]
async fn quote_outage_does_not_fire_or_disarm() {
    let container = container();
    let monitor = container.monitor();
    let carol = UserId::new("carol");
    let abc = Symbol::new("ABC");

    fund_and_buy(&container, &carol, "ABC", 10, 5).await;
    let mut rx = monitor.fire_updates();

    monitor
        .set_standing_amount(&carol, &abc, OrderSide::Sell, Quantity::new(5))
        .await
        .unwrap();
    monitor
        .set_trigger(&carol, &abc, OrderSide::Sell, Money::dollars(12))
        .await
        .unwrap();

    container.quotes().set_failing(true);
    tokio::time::sleep(POLL * 4).await;
    assert!(rx.try_recv().is_err());
    let key = TriggerKey::new(carol.clone(), abc.clone(), OrderSide::Sell);
    assert_eq!(monitor.trigger_state(&key).await, TriggerState::Armed);

    container.quotes().set_failing(false);
    container.quotes().set_price("ABC", Money::dollars(12));
    assert!(next_report(&mut rx).await.is_executed());
    assert_eq!(
        container.coordinator().balance(&carol).await.unwrap(),
        Money::dollars(60)
    );
}

// =============================================================================
// Two-phase orders and triggers together
// =============================================================================

#[tokio::test(start_paused = true)]
async fn firing_does_not_consume_staged_orders() {
    let container = container();
    let monitor = container.monitor();
    let coordinator = container.coordinator();
    let dave = UserId::new("dave");
    let abc = Symbol::new("ABC");

    container.quotes().set_price("ABC", Money::dollars(20));
    coordinator.add_funds(&dave, Money::dollars(200)).await.unwrap();
    let staged = coordinator
        .stage(OrderSide::Buy, &dave, &abc, Money::dollars(60))
        .await
        .unwrap();

    let mut rx = monitor.fire_updates();
    monitor
        .set_standing_amount(&dave, &abc, OrderSide::Buy, Quantity::new(4))
        .await
        .unwrap();
    monitor
        .set_trigger(&dave, &abc, OrderSide::Buy, Money::dollars(25))
        .await
        .unwrap();

    assert!(next_report(&mut rx).await.is_executed());
    assert_eq!(coordinator.balance(&dave).await.unwrap(), Money::dollars(60));

    let pending = coordinator.pending_orders(&dave, OrderSide::Buy).await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, staged.id);

    coordinator.commit(OrderSide::Buy, &dave).await.unwrap();
    assert_eq!(coordinator.holding(&dave, &abc).await.unwrap(), Quantity::new(7));
}

// =============================================================================
// Shutdown and restore
// =============================================================================

#[tokio::test(start_paused = true)]
async fn restored_monitor_rearms_stored_triggers() {
    let ledger = Arc::new(InMemoryLedger::new());
    let quotes = Arc::new(MockQuoteSource::new());
    quotes.set_price("ABC", Money::dollars(30));
    let erin = UserId::new("erin");
    let abc = Symbol::new("ABC");
    let config = TriggerMonitorConfig {
        poll_interval: POLL,
        ..TriggerMonitorConfig::default()
    };

    let first = Container::new(
        Arc::clone(&ledger),
        Arc::clone(&quotes),
        config.clone(),
        CancellationToken::new(),
    );
    first
        .coordinator()
        .add_funds(&erin, Money::dollars(100))
        .await
        .unwrap();
    first
        .monitor()
        .set_standing_amount(&erin, &abc, OrderSide::Buy, Quantity::new(3))
        .await
        .unwrap();
    first
        .monitor()
        .set_trigger(&erin, &abc, OrderSide::Buy, Money::dollars(25))
        .await
        .unwrap();
    first.monitor().shutdown().await;
    assert_eq!(first.monitor().active_watchers().await, 0);

    let second = Container::new(ledger, Arc::clone(&quotes), config, CancellationToken::new());
    let mut rx = second.monitor().fire_updates();
    assert_eq!(second.monitor().restore().await.unwrap(), 1);

    quotes.set_price("ABC", Money::dollars(25));
    let report = next_report(&mut rx).await;
    assert_eq!(
        report.outcome,
        FireOutcome::Executed {
            quantity: Quantity::new(3),
            amount: Money::dollars(75),
        }
    );
    assert_eq!(
        second.coordinator().balance(&erin).await.unwrap(),
        Money::dollars(25)
    );
}
