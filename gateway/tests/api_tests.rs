//! End-to-end tests of the HTTP surface against a real ledger in a temp dir

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use payment_gateway::{router, AppState};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wallet_ledger::{Config, Ledger};

fn test_app() -> (Router, AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    config.seed.enabled = false;

    let ledger = Ledger::open(config).unwrap();
    ledger.create_wallet("wallet-1", dec!(100)).unwrap();
    ledger.create_wallet("wallet-2", dec!(100)).unwrap();

    let state = AppState::new(ledger);
    let app = router(state.clone(), Duration::from_secs(5));
    (app, state, temp_dir)
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn send_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/send")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_send_success() {
    let (app, _state, _temp) = test_app();

    let (status, body) = call(
        &app,
        send_request(r#"{"from": "wallet-1", "to": "wallet-2", "amount": 10.5}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));

    let (status, body) = call(&app, get("/api/wallet/wallet-1/balance")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"balance": 89.5}));

    let (status, body) = call(&app, get("/api/wallet/wallet-2/balance")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"balance": 110.5}));
}

#[tokio::test]
async fn test_send_invalid_body() {
    let (app, _state, _temp) = test_app();

    let (status, body) = call(
        &app,
        send_request(r#"{"from": "wallet-1", "to": "wallet-2", "amount": "ten"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid request body"}));

    let (status, _) = call(&app, send_request("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_send_validation_errors() {
    let (app, state, _temp) = test_app();

    let (status, body) = call(
        &app,
        send_request(r#"{"from": "wallet-1", "to": "wallet-2", "amount": -5}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "amount must be positive"}));

    let (status, body) = call(
        &app,
        send_request(r#"{"from": "wallet-1", "to": "wallet-1", "amount": 10}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "cannot send money to yourself"}));

    assert_eq!(state.ledger.get_balance("wallet-1").unwrap(), dec!(100));
}

#[tokio::test]
async fn test_send_insufficient_funds() {
    let (app, state, _temp) = test_app();

    let (status, body) = call(
        &app,
        send_request(r#"{"from": "wallet-1", "to": "wallet-2", "amount": 150}"#),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body, json!({"error": "insufficient funds"}));
    assert_eq!(state.ledger.get_balance("wallet-1").unwrap(), dec!(100));
}

#[tokio::test]
async fn test_send_unknown_wallet() {
    let (app, _state, _temp) = test_app();

    let (status, body) = call(
        &app,
        send_request(r#"{"from": "wallet-1", "to": "ghost", "amount": 1}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "wallet not found"}));
}

#[tokio::test]
async fn test_balance_unknown_wallet() {
    let (app, _state, _temp) = test_app();

    let (status, body) = call(&app, get("/api/wallet/ghost/balance")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "wallet not found"}));
}

#[tokio::test]
async fn test_transactions_newest_first() {
    let (app, _state, _temp) = test_app();

    for amount in [1, 2, 3] {
        let body = format!(r#"{{"from": "wallet-1", "to": "wallet-2", "amount": {amount}}}"#);
        let (status, _) = call(&app, send_request(&body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(&app, get("/api/transactions?count=2")).await;
    assert_eq!(status, StatusCode::OK);

    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["amount"], json!(3.0));
    assert_eq!(records[1]["amount"], json!(2.0));
    assert_eq!(records[0]["from"], json!("wallet-1"));
    assert_eq!(records[0]["to"], json!("wallet-2"));
    assert!(records[0]["timestamp"].is_string());
}

#[tokio::test]
async fn test_transactions_empty_log() {
    let (app, _state, _temp) = test_app();

    let (status, body) = call(&app, get("/api/transactions?count=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_transactions_invalid_count() {
    let (app, _state, _temp) = test_app();

    for uri in ["/api/transactions", "/api/transactions?count=abc"] {
        let (status, body) = call(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({"error": "invalid count"}));
    }

    for uri in ["/api/transactions?count=0", "/api/transactions?count=-3"] {
        let (status, _) = call(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_health_and_metrics() {
    let (app, _state, _temp) = test_app();

    let (status, body) = call(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["service"], json!("wallet-ledger"));

    call(
        &app,
        send_request(r#"{"from": "wallet-1", "to": "wallet-2", "amount": 1}"#),
    )
    .await;

    let (status, body) = call(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("ledger_transfers_total 1"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (app, _state, _temp) = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
