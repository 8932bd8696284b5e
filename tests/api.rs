//! HTTP round trips through the full router and middleware stack

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use roulette_engine::api::{build_app, AppState};
use roulette_engine::{EngineConfig, FixedWheel, Pocket};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

fn app(pocket: Pocket) -> (Router, Arc<AppState>) {
    let config = EngineConfig::default();
    let state = Arc::new(AppState::with_wheel(&config, Arc::new(FixedWheel(pocket))));
    (build_app(state.clone(), &config), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

#[tokio::test]
async fn spin_round_trip() {
    let (app, _) = app(Pocket::Number(17));

    let (status, body) = send(&app, "POST", "/accounts", Some(json!({"player_id": "alice"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&body["balance"]), dec!(1000));

    let (status, body) = send(
        &app,
        "POST",
        "/spin",
        Some(json!({
            "player_id": "alice",
            "wagers": [
                {"kind": "straight", "selector": 17, "amount": 10},
                {"type": "black", "amount": 5},
                {"kind": "red"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!(17));
    assert_eq!(body["color"], json!("black"));
    assert_eq!(decimal(&body["total_win"]), dec!(370));
    assert_eq!(decimal(&body["new_balance"]), dec!(1355));
    assert_eq!(body["wagers"][2]["malformed"], json!(true));

    let (status, body) = send(&app, "GET", "/accounts/alice/balance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["balance"]), dec!(1355));
}

#[tokio::test]
async fn insufficient_balance_is_a_bad_request() {
    let (app, state) = app(Pocket::Number(1));
    state.ledger.open_account(&"bob".into()).unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/spin",
        Some(json!({"player_id": "bob", "wagers": [{"kind": "red", "amount": 5000}]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("INSUFFICIENT_BALANCE"));
    assert_eq!(body["error"]["retryable"], json!(false));
    assert_eq!(decimal(&body["error"]["details"]["available"]), dec!(1000));
}

#[tokio::test]
async fn unknown_player_is_not_found() {
    let (app, _) = app(Pocket::Number(1));

    let (status, body) = send(
        &app,
        "POST",
        "/spin",
        Some(json!({"player_id": "ghost", "wagers": [{"kind": "red", "amount": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("UNKNOWN_PLAYER"));

    let (status, _) = send(&app, "GET", "/accounts/ghost/balance", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn accounts_open_once_and_accept_deposits() {
    let (app, _) = app(Pocket::Number(1));

    send(&app, "POST", "/accounts", Some(json!({"player_id": "carol"}))).await;
    let (status, body) = send(&app, "POST", "/accounts", Some(json!({"player_id": "carol"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("ACCOUNT_EXISTS"));

    let (status, body) = send(
        &app,
        "POST",
        "/accounts/carol/deposit",
        Some(json!({"amount": "250.75"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["balance"]), dec!(1250.75));

    let (status, _) = send(&app, "POST", "/accounts/carol/deposit", Some(json!({"amount": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payout_table_and_health() {
    let (app, _) = app(Pocket::Number(1));

    let (status, body) = send(&app, "GET", "/payouts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pockets"], json!(38));
    assert_eq!(body["payouts"].as_array().unwrap().len(), 13);
    assert_eq!(body["payouts"][0]["payout_multiplier"], json!(35));

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("Running"));
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (app, _) = app(Pocket::Number(1));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-123");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn metrics_endpoint_exposes_counters() {
    let (app, state) = app(Pocket::Number(1));
    state.ledger.open_account(&"dave".into()).unwrap();
    send(
        &app,
        "POST",
        "/spin",
        Some(json!({"player_id": "dave", "wagers": [{"kind": "red", "amount": 1}]})),
    )
    .await;

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("roulette_spins_settled_total 1"));
}

#[tokio::test]
async fn non_object_wagers_are_skipped_not_fatal() {
    let (app, state) = app(Pocket::Number(1));
    state.ledger.open_account(&"erin".into()).unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/spin",
        Some(json!({
            "player_id": "erin",
            "wagers": [{"kind": "red", "amount": 10}, null, "black", 5]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["total_stake"]), dec!(10));
    assert_eq!(decimal(&body["new_balance"]), dec!(1010));
    for index in 1..4 {
        assert_eq!(body["wagers"][index]["malformed"], json!(true));
    }
}

#[tokio::test]
async fn bets_key_is_accepted_and_a_missing_list_is_rejected() {
    let (app, state) = app(Pocket::Number(1));
    state.ledger.open_account(&"frank".into()).unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/spin",
        Some(json!({"player_id": "frank", "bets": [{"type": "red", "amount": 10}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["total_stake"]), dec!(10));
    assert_eq!(decimal(&body["new_balance"]), dec!(1010));

    let (status, body) = send(&app, "POST", "/spin", Some(json!({"player_id": "frank"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("INVALID_REQUEST"));
    assert_eq!(state.ledger.account(&"frank".into()).unwrap().version, 2);
}

#[tokio::test]
async fn deposit_overflow_is_an_invalid_amount() {
    let (app, state) = app(Pocket::Number(1));
    state.ledger.open_account(&"gina".into()).unwrap();
    let deposit = json!({"amount": "79000000000000000000000000000"});

    let (status, _) = send(&app, "POST", "/accounts/gina/deposit", Some(deposit.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/accounts/gina/deposit", Some(deposit)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("INVALID_AMOUNT"));
    assert_eq!(
        state.ledger.account(&"gina".into()).unwrap().balance,
        decimal(&json!("79000000000000000000000001000"))
    );
}
