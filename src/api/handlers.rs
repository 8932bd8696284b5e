//! Request Handlers
//!
//! Thin adapters from HTTP to the settlement engine and the account ledger.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::config::EngineConfig;
use crate::games::payout::payout_info;
use crate::games::settlement::SettlementEngine;
use crate::games::types::{PlayerId, Pocket, SettlementResult};
use crate::games::wheel::{RngWheel, Wheel};
use crate::ledger::InMemoryLedger;
use crate::metrics::SettlementMetrics;
use crate::notifications::BroadcastSink;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub engine: SettlementEngine,
    pub ledger: Arc<InMemoryLedger>,
    pub metrics: Arc<SettlementMetrics>,
    pub events: BroadcastSink,
    pub enable_metrics: bool,
    pub version: String,
}

impl AppState {
    /// Wire ledger, wheel and engine from configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_wheel(config, Arc::new(RngWheel::from_seed(config.wheel.seed)))
    }

    /// Same as `from_config` with an explicit wheel
    pub fn with_wheel(config: &EngineConfig, wheel: Arc<dyn Wheel>) -> Self {
        let ledger = Arc::new(InMemoryLedger::new(config.ledger.initial_balance));
        let metrics = Arc::new(SettlementMetrics::new());
        let events = BroadcastSink::new(config.monitoring.event_channel_capacity);

        let engine = SettlementEngine::new(ledger.clone(), wheel, config.settlement.clone())
            .with_metrics(metrics.clone())
            .with_sink(Arc::new(events.clone()));

        Self {
            engine,
            ledger,
            metrics,
            events,
            enable_metrics: config.monitoring.enable_metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check handler - minimal response time
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.metrics.uptime().as_secs(),
    })
}

/// Settle one spin
/// POST /spin
pub async fn spin_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpinRequest>, JsonRejection>,
) -> Result<Json<SettlementResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::bad_request(request_id.0.clone(), rejection.body_text()).with_code("INVALID_REQUEST")
    })?;

    tracing::debug!(
        request_id = %request_id.0,
        player = %request.player_id,
        wagers = request.wagers.len(),
        "Spin request"
    );

    state
        .engine
        .resolve_spin(&request.player_id, request.wagers)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_settlement(request_id.0, e))
}

/// Open an account with the configured initial balance
/// POST /accounts
pub async fn open_account_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<BalanceResponse>), ApiError> {
    if request.player_id.as_str().trim().is_empty() {
        return Err(ApiError::bad_request(
            request_id.0,
            "player_id cannot be empty".to_string(),
        ));
    }

    let balance = state
        .ledger
        .open_account(&request.player_id)
        .map_err(|e| ApiError::from_ledger(request_id.0, e))?;

    tracing::info!(player = %request.player_id, %balance, "Account opened");
    Ok((
        StatusCode::CREATED,
        Json(BalanceResponse {
            player_id: request.player_id,
            balance,
        }),
    ))
}

/// GET /accounts/:player_id/balance
pub async fn balance_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let player_id = PlayerId::from(player_id);
    let account = state.ledger.account(&player_id).ok_or_else(|| {
        ApiError::not_found(request_id.0.clone(), format!("Unknown player: {}", player_id))
            .with_code("UNKNOWN_PLAYER")
    })?;

    Ok(Json(BalanceResponse {
        player_id,
        balance: account.balance,
    }))
}

/// POST /accounts/:player_id/deposit
pub async fn deposit_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let player_id = PlayerId::from(player_id);
    let balance = state
        .ledger
        .deposit(&player_id, request.amount)
        .map_err(|e| ApiError::from_ledger(request_id.0, e))?;

    tracing::info!(player = %player_id, amount = %request.amount, %balance, "Deposit applied");
    Ok(Json(BalanceResponse { player_id, balance }))
}

/// GET /payouts
pub async fn payouts_handler() -> Json<PayoutsResponse> {
    Json(PayoutsResponse {
        pockets: Pocket::COUNT,
        payouts: payout_info(),
    })
}

/// Prometheus text exposition
/// GET /metrics
pub async fn metrics_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.enable_metrics {
        return Err(ApiError::not_found(
            request_id.0,
            "Metrics are disabled".to_string(),
        ));
    }

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.to_prometheus_format(),
    ))
}
