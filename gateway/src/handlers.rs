//! HTTP handlers
//!
//! Each handler decodes its request, runs the ledger call on the blocking
//! pool and shapes the JSON response. Failures map through [`ApiError`].

use crate::errors::{ApiError, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wallet_ledger::{Ledger, TransactionRecord};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ledger shared by every request
    pub ledger: Arc<Ledger>,
}

impl AppState {
    /// Wrap an opened ledger
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(ledger),
        }
    }

    /// Run a ledger call off the async runtime
    async fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: FnOnce(&Ledger) -> wallet_ledger::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let ledger = self.ledger.clone();
        tokio::task::spawn_blocking(move || call(&ledger))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Ledger task failed");
                ApiError::Internal
            })?
            .map_err(ApiError::from)
    }
}

/// `POST /api/send` body
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Debited wallet
    pub from: String,
    /// Credited wallet
    pub to: String,
    /// Amount, as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// `{"status": ...}` reply
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always `success`
    pub status: &'static str,
}

/// Balance reply
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Committed balance
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

/// `GET /api/transactions` query
#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    /// Maximum records; parsed by the handler
    pub count: Option<String>,
}

/// One history entry as returned over HTTP
#[derive(Debug, Serialize)]
pub struct TransactionView {
    /// Debited wallet
    pub from: String,
    /// Credited wallet
    pub to: String,
    /// Transferred amount
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Commit time
    pub timestamp: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionView {
    fn from(record: TransactionRecord) -> Self {
        Self {
            from: record.from.as_str().to_string(),
            to: record.to.as_str().to_string(),
            amount: record.amount,
            timestamp: record.timestamp,
        }
    }
}

/// Liveness reply
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while serving
    pub status: &'static str,
    /// Ledger service name
    pub service: String,
    /// Crate version
    pub version: &'static str,
}

/// `POST /api/send`: execute a transfer
pub async fn send(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>> {
    let Json(req) = payload?;

    state
        .run(move |ledger| ledger.make_transaction(&req.from, &req.to, req.amount))
        .await?;

    Ok(Json(StatusResponse { status: "success" }))
}

/// `GET /api/wallet/:address/balance`
pub async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>> {
    let balance = state
        .run(move |ledger| ledger.get_balance(&address))
        .await?;

    Ok(Json(BalanceResponse { balance }))
}

/// `GET /api/transactions?count=N`: newest first
pub async fn transactions(
    State(state): State<AppState>,
    query: std::result::Result<Query<TransactionsQuery>, QueryRejection>,
) -> Result<Json<Vec<TransactionView>>> {
    let Query(query) = query.map_err(|_| ApiError::InvalidCount)?;
    let count = query
        .count
        .as_deref()
        .and_then(|c| c.parse::<i64>().ok())
        .ok_or(ApiError::InvalidCount)?;

    let records = state
        .run(move |ledger| ledger.get_recent_transactions(count))
        .await?;

    Ok(Json(records.into_iter().map(TransactionView::from).collect()))
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: state.ledger.config().service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /metrics`: Prometheus text format
pub async fn metrics_handler(State(state): State<AppState>) -> Result<String> {
    state.ledger.metrics().export().map_err(|e| {
        tracing::error!(error = %e, "Failed to export metrics");
        ApiError::Internal
    })
}
