//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to the coordinator and trigger monitor.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::application::dto::{AccountSummaryDto, PendingOrderDto};
use crate::application::ports::{LedgerPort, QuoteSourcePort};
use crate::application::services::TriggerMonitorService;
use crate::application::use_cases::TransactionCoordinator;
use crate::domain::conditional_orders::TriggerKey;
use crate::domain::order_staging::OrderSide;
use crate::domain::shared::{Money, Quantity};

use super::request::{
    AddFundsRequest, SetTriggerRequest, StageOrderRequest, StandingAmountRequest, SymbolRequest,
    UserRequest, parse_symbol, parse_user,
};
use super::response::{
    ApiError, BalanceResponse, CancelTriggerResponse, HealthResponse, QuoteResponse,
    StandingAmountResponse, TriggerResponse,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Application state shared across handlers.
pub struct AppState<L, Q>
where
    L: LedgerPort,
    Q: QuoteSourcePort,
{
    /// Stage/commit/cancel coordinator.
    pub coordinator: Arc<TransactionCoordinator<L, Q>>,
    /// Conditional order watchers.
    pub monitor: Arc<TriggerMonitorService<L, Q>>,
    /// Application version.
    pub version: String,
}

impl<L, Q> Clone for AppState<L, Q>
where
    L: LedgerPort,
    Q: QuoteSourcePort,
{
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            monitor: Arc::clone(&self.monitor),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<L, Q>(state: AppState<L, Q>) -> Router
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/add", post(add_funds))
        .route("/quote", post(quote))
        .route("/account", post(account))
        .route("/buy", post(stage_buy))
        .route("/commit_buy", post(commit_buy))
        .route("/cancel_buy", post(cancel_buy))
        .route("/sell", post(stage_sell))
        .route("/commit_sell", post(commit_sell))
        .route("/cancel_sell", post(cancel_sell))
        .route("/set_buy_amount", post(set_buy_amount))
        .route("/set_buy_trigger", post(set_buy_trigger))
        .route("/cancel_set_buy", post(cancel_set_buy))
        .route("/set_sell_amount", post(set_sell_amount))
        .route("/set_sell_trigger", post(set_sell_trigger))
        .route("/cancel_set_sell", post(cancel_set_sell))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check<L, Q>(State(state): State<AppState<L, Q>>) -> Json<HealthResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        active_watchers: state.monitor.active_watchers().await,
    })
}

async fn add_funds<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<AddFundsRequest>,
) -> ApiResult<BalanceResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    let user = parse_user(&request.user_id)?;
    let balance = state
        .coordinator
        .add_funds(&user, Money::new(request.amount))
        .await?;

    Ok(Json(BalanceResponse {
        user_id: user.to_string(),
        balance,
    }))
}

async fn quote<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<SymbolRequest>,
) -> ApiResult<QuoteResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    let user = parse_user(&request.user_id)?;
    let symbol = parse_symbol(&request.symbol)?;
    let quote = state.coordinator.quote(&symbol).await?;

    Ok(Json(QuoteResponse {
        user_id: user.to_string(),
        symbol: quote.symbol.to_string(),
        price: quote.price,
        as_of: quote.as_of.to_rfc3339(),
    }))
}

async fn account<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<UserRequest>,
) -> ApiResult<AccountSummaryDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    let user = parse_user(&request.user_id)?;
    Ok(Json(state.coordinator.account_summary(&user).await?))
}

// ---------------------------------------------------------------------------
// Two-phase orders
// ---------------------------------------------------------------------------

async fn stage<L, Q>(
    state: &AppState<L, Q>,
    side: OrderSide,
    request: StageOrderRequest,
) -> ApiResult<PendingOrderDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    let user = parse_user(&request.user_id)?;
    let symbol = parse_symbol(&request.symbol)?;
    let order = state
        .coordinator
        .stage(side, &user, &symbol, Money::new(request.amount))
        .await?;
    Ok(Json(PendingOrderDto::from(&order)))
}

async fn commit<L, Q>(
    state: &AppState<L, Q>,
    side: OrderSide,
    request: UserRequest,
) -> ApiResult<PendingOrderDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    let user = parse_user(&request.user_id)?;
    let order = state.coordinator.commit(side, &user).await?;
    Ok(Json(PendingOrderDto::from(&order)))
}

async fn cancel<L, Q>(
    state: &AppState<L, Q>,
    side: OrderSide,
    request: UserRequest,
) -> ApiResult<PendingOrderDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    let user = parse_user(&request.user_id)?;
    let order = state.coordinator.cancel(side, &user).await?;
    Ok(Json(PendingOrderDto::from(&order)))
}

async fn stage_buy<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<StageOrderRequest>,
) -> ApiResult<PendingOrderDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    stage(&state, OrderSide::Buy, request).await
}

async fn stage_sell<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<StageOrderRequest>,
) -> ApiResult<PendingOrderDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    stage(&state, OrderSide::Sell, request).await
}

async fn commit_buy<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<UserRequest>,
) -> ApiResult<PendingOrderDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    commit(&state, OrderSide::Buy, request).await
}

async fn commit_sell<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<UserRequest>,
) -> ApiResult<PendingOrderDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    commit(&state, OrderSide::Sell, request).await
}

async fn cancel_buy<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<UserRequest>,
) -> ApiResult<PendingOrderDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    cancel(&state, OrderSide::Buy, request).await
}

async fn cancel_sell<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<UserRequest>,
) -> ApiResult<PendingOrderDto>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    cancel(&state, OrderSide::Sell, request).await
}

// ---------------------------------------------------------------------------
// Conditional orders
// ---------------------------------------------------------------------------

async fn set_amount<L, Q>(
    state: &AppState<L, Q>,
    side: OrderSide,
    request: StandingAmountRequest,
) -> ApiResult<StandingAmountResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    let user = parse_user(&request.user_id)?;
    let symbol = parse_symbol(&request.symbol)?;
    let quantity = state
        .monitor
        .set_standing_amount(&user, &symbol, side, Quantity::new(request.quantity))
        .await?;

    Ok(Json(StandingAmountResponse {
        user_id: user.to_string(),
        symbol: symbol.to_string(),
        side,
        quantity,
    }))
}

async fn set_trigger<L, Q>(
    state: &AppState<L, Q>,
    side: OrderSide,
    request: SetTriggerRequest,
) -> ApiResult<TriggerResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    let user = parse_user(&request.user_id)?;
    let symbol = parse_symbol(&request.symbol)?;
    let trigger = state
        .monitor
        .set_trigger(&user, &symbol, side, Money::new(request.price))
        .await?;
    let key = TriggerKey::new(user, symbol, side);
    let watcher_state = state.monitor.trigger_state(&key).await;

    Ok(Json(TriggerResponse {
        user_id: key.user.to_string(),
        symbol: key.symbol.to_string(),
        side,
        target_price: trigger.target_price,
        state: watcher_state,
    }))
}

async fn cancel_trigger<L, Q>(
    state: &AppState<L, Q>,
    side: OrderSide,
    request: SymbolRequest,
) -> ApiResult<CancelTriggerResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    let user = parse_user(&request.user_id)?;
    let symbol = parse_symbol(&request.symbol)?;
    state.monitor.cancel_trigger(&user, &symbol, side).await?;

    Ok(Json(CancelTriggerResponse {
        user_id: user.to_string(),
        symbol: symbol.to_string(),
        side,
        cancelled: true,
    }))
}

async fn set_buy_amount<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<StandingAmountRequest>,
) -> ApiResult<StandingAmountResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    set_amount(&state, OrderSide::Buy, request).await
}

async fn set_sell_amount<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<StandingAmountRequest>,
) -> ApiResult<StandingAmountResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    set_amount(&state, OrderSide::Sell, request).await
}

async fn set_buy_trigger<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<SetTriggerRequest>,
) -> ApiResult<TriggerResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    set_trigger(&state, OrderSide::Buy, request).await
}

async fn set_sell_trigger<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<SetTriggerRequest>,
) -> ApiResult<TriggerResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    set_trigger(&state, OrderSide::Sell, request).await
}

async fn cancel_set_buy<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<SymbolRequest>,
) -> ApiResult<CancelTriggerResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    cancel_trigger(&state, OrderSide::Buy, request).await
}

async fn cancel_set_sell<L, Q>(
    State(state): State<AppState<L, Q>>,
    Json(request): Json<SymbolRequest>,
) -> ApiResult<CancelTriggerResponse>
where
    L: LedgerPort + 'static,
    Q: QuoteSourcePort + 'static,
{
    cancel_trigger(&state, OrderSide::Sell, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::TriggerMonitorConfig;
    use crate::infrastructure::http::response::{ApiErrorResponse, HealthResponse};
    use crate::infrastructure::persistence::InMemoryLedger;
    use crate::infrastructure::quotes::MockQuoteSource;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rust_decimal_macros::dec;
    use test_case::test_case;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    type TestState = AppState<InMemoryLedger, MockQuoteSource>;

    fn create_test_state() -> (TestState, Arc<MockQuoteSource>) {
        let ledger = Arc::new(InMemoryLedger::new());
        let quotes = Arc::new(MockQuoteSource::new());
        quotes.set_price("ABC", Money::dollars(50));

        let coordinator = Arc::new(TransactionCoordinator::new(ledger, Arc::clone(&quotes)));
        let monitor = Arc::new(TriggerMonitorService::new(
            TriggerMonitorConfig::default(),
            Arc::clone(&coordinator),
            CancellationToken::new(),
        ));

        (
            AppState {
                coordinator,
                monitor,
                version: "1.0.0-test".to_string(),
            },
            quotes,
        )
    }

    async fn post_json(
        app: Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
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
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let (state, _) = create_test_state();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.version, "1.0.0-test");
        assert_eq!(health.active_watchers, 0);
    }

    #[tokio::test]
    async fn stage_and_commit_buy_over_http() {
        let (state, _) = create_test_state();
        let app = create_router(state);

        let (status, body) = post_json(
            app.clone(),
            "/add",
            serde_json::json!({"user_id": "alice", "amount": 1000}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], "1000");

        let (status, body) = post_json(
            app.clone(),
            "/buy",
            serde_json::json!({"user_id": "alice", "symbol": "abc", "amount": "250"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quantity"], 5);
        assert_eq!(body["symbol"], "ABC");
        assert_eq!(body["side"], "BUY");

        let (status, _) = post_json(
            app.clone(),
            "/commit_buy",
            serde_json::json!({"user_id": "alice"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(
            app.clone(),
            "/commit_buy",
            serde_json::json!({"user_id": "alice"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: ApiErrorResponse = serde_json::from_value(body).unwrap();
        assert_eq!(error.code, "NO_PENDING_ORDER");

        let (status, body) =
            post_json(app, "/account", serde_json::json!({"user_id": "alice"})).await;
        assert_eq!(status, StatusCode::OK);
        let summary: AccountSummaryDto = serde_json::from_value(body).unwrap();
        assert_eq!(summary.balance, Money::dollars(750));
        assert!(summary.pending_buys.is_empty());
    }

    #[test_case("/buy", serde_json::json!({"user_id": "bob", "symbol": "ABC", "amount": 100}), StatusCode::CONFLICT ; "buy without funds")]
    #[test_case("/sell", serde_json::json!({"user_id": "bob", "symbol": "ABC", "amount": 100}), StatusCode::CONFLICT ; "sell without shares")]
    #[test_case("/cancel_sell", serde_json::json!({"user_id": "bob"}), StatusCode::CONFLICT ; "cancel empty stack")]
    #[test_case("/buy", serde_json::json!({"user_id": "bob", "symbol": "ABC", "amount": 0}), StatusCode::UNPROCESSABLE_ENTITY ; "zero amount")]
    #[test_case("/buy", serde_json::json!({"user_id": "bob", "symbol": "A-B", "amount": 10}), StatusCode::UNPROCESSABLE_ENTITY ; "bad symbol")]
    #[test_case("/buy", serde_json::json!({"user_id": " ", "symbol": "ABC", "amount": 10}), StatusCode::UNPROCESSABLE_ENTITY ; "blank user")]
    #[test_case("/add", serde_json::json!({"user_id": "bob", "amount": -5}), StatusCode::UNPROCESSABLE_ENTITY ; "negative deposit")]
    #[test_case("/quote", serde_json::json!({"user_id": "bob", "symbol": "ZZZ"}), StatusCode::SERVICE_UNAVAILABLE ; "unknown symbol")]
    #[test_case("/cancel_set_buy", serde_json::json!({"user_id": "bob", "symbol": "ABC"}), StatusCode::NOT_FOUND ; "cancel missing trigger")]
    #[test_case("/set_sell_trigger", serde_json::json!({"user_id": "bob", "symbol": "ABC", "price": 0}), StatusCode::UNPROCESSABLE_ENTITY ; "zero trigger price")]
    #[test_case("/set_buy_amount", serde_json::json!({"user_id": "bob", "symbol": "ABC", "quantity": 0}), StatusCode::UNPROCESSABLE_ENTITY ; "zero standing amount")]
    #[tokio::test]
    async fn error_status_mapping(uri: &str, body: serde_json::Value, expected: StatusCode) {
        let (state, _) = create_test_state();
        let (status, body) = post_json(create_router(state), uri, body).await;
        assert_eq!(status, expected);
        assert!(body["code"].is_string());
    }

    #[tokio::test]
    async fn quote_returns_price() {
        let (state, quotes) = create_test_state();
        quotes.set_price("XYZ", Money::new(dec!(12.34)));

        let (status, body) = post_json(
            create_router(state),
            "/quote",
            serde_json::json!({"user_id": "alice", "symbol": "xyz"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let quote: QuoteResponse = serde_json::from_value(body).unwrap();
        assert_eq!(quote.symbol, "XYZ");
        assert_eq!(quote.price, Money::new(dec!(12.34)));
    }

    #[tokio::test]
    async fn trigger_routes_set_and_cancel() {
        let (state, _) = create_test_state();
        let monitor = Arc::clone(&state.monitor);
        let app = create_router(state);

        let (status, body) = post_json(
            app.clone(),
            "/set_buy_amount",
            serde_json::json!({"user_id": "alice", "symbol": "ABC", "quantity": 3}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quantity"], 3);

        let (status, body) = post_json(
            app.clone(),
            "/set_buy_trigger",
            serde_json::json!({"user_id": "alice", "symbol": "ABC", "price": "40"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "ARMED");
        assert_eq!(monitor.active_watchers().await, 1);

        let (status, body) = post_json(
            app,
            "/cancel_set_buy",
            serde_json::json!({"user_id": "alice", "symbol": "ABC"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cancelled"], true);
        assert_eq!(monitor.active_watchers().await, 0);

        monitor.shutdown().await;
    }
}
