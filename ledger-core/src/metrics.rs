//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `ledger_transfers_total` - Committed transfers
//! - `ledger_transfer_failures_total{kind}` - Rejected or failed transfers by error kind
//! - `ledger_transfer_retries_total` - Units of work retried after a lock conflict
//! - `ledger_transfer_duration_seconds` - Histogram of transfer latencies

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Committed transfers
    pub transfers_total: IntCounter,

    /// Failed transfers, labelled by error kind
    pub transfer_failures: IntCounterVec,

    /// Lock-conflict retries
    pub transfer_retries: IntCounter,

    /// Transfer duration histogram
    pub transfer_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("transfers_total", &self.transfers_total.get())
            .field("transfer_retries", &self.transfer_retries.get())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transfers_total =
            IntCounter::new("ledger_transfers_total", "Total number of committed transfers")?;
        registry.register(Box::new(transfers_total.clone()))?;

        let transfer_failures = IntCounterVec::new(
            Opts::new(
                "ledger_transfer_failures_total",
                "Total number of failed transfers by error kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(transfer_failures.clone()))?;

        let transfer_retries = IntCounter::new(
            "ledger_transfer_retries_total",
            "Units of work retried after a lock conflict",
        )?;
        registry.register(Box::new(transfer_retries.clone()))?;

        let transfer_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_transfer_duration_seconds",
                "Histogram of transfer latencies",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 1.0]),
        )?;
        registry.register(Box::new(transfer_duration.clone()))?;

        Ok(Self {
            transfers_total,
            transfer_failures,
            transfer_retries,
            transfer_duration,
            registry,
        })
    }

    /// Record committed transfer
    pub fn record_transfer(&self, duration_seconds: f64) {
        self.transfers_total.inc();
        self.transfer_duration.observe(duration_seconds);
    }

    /// Record failed transfer
    pub fn record_failure(&self, kind: &str) {
        self.transfer_failures.with_label_values(&[kind]).inc();
    }

    /// Record lock-conflict retry
    pub fn record_retry(&self) {
        self.transfer_retries.inc();
    }

    /// Render in the Prometheus text exposition format
    pub fn export(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
