//! API Request and Response Models

use crate::games::payout::PayoutInfo;
use crate::games::types::{PlayerId, RawWager};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// POST /spin body. `player_id` is already authenticated upstream.
///
/// Older clients send the list as `bets`. Individual entries never fail the
/// body; see `RawWager`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinRequest {
    pub player_id: PlayerId,
    #[serde(alias = "bets")]
    pub wagers: Vec<RawWager>,
}

/// POST /accounts body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAccountRequest {
    pub player_id: PlayerId,
}

/// POST /accounts/:player_id/deposit body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub player_id: PlayerId,
    pub balance: Decimal,
}

/// GET /payouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutsResponse {
    pub pockets: usize,
    pub payouts: Vec<PayoutInfo>,
}
