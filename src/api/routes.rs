//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/spin", post(spin_handler))
        .route("/accounts", post(open_account_handler))
        .route("/accounts/:player_id/balance", get(balance_handler))
        .route("/accounts/:player_id/deposit", post(deposit_handler))
        .route("/payouts", get(payouts_handler))
        // Metrics endpoint for Prometheus
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
