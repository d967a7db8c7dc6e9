//! Main ledger orchestration layer
//!
//! Owns the store handle and wires validation, the transfer engine and the
//! query layer into the three operations exposed to the service boundary.
//!
//! # Example
//!
//! ```no_run
//! use rust_decimal::Decimal;
//! use wallet_ledger::{Config, Ledger};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = Ledger::open(Config::default())?;
//!
//!     ledger.make_transaction("wallet-1", "wallet-2", Decimal::TEN)?;
//!     let balance = ledger.get_balance("wallet-2")?;
//!     let history = ledger.get_recent_transactions(10)?;
//!
//!     println!("{} {}", balance, history.len());
//!     ledger.close()?;
//!     Ok(())
//! }
//! ```

use crate::{
    engine::{RetryPolicy, TransferEngine},
    metrics::Metrics,
    query::QueryService,
    storage::Storage,
    types::{TransactionRecord, Wallet, WalletAddress},
    validation::validate_transfer,
    Config, Error, Result, StoreError,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;

/// Main ledger interface
#[derive(Debug)]
pub struct Ledger {
    /// Shared store handle
    storage: Arc<Storage>,

    /// Sole mutator of balances
    engine: TransferEngine,

    /// Read-only lookups
    query: QueryService,

    /// Transfer metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open ledger with configuration, seeding wallets on first start
    pub fn open(config: Config) -> std::result::Result<Self, StoreError> {
        config.validate()?;

        let storage = Arc::new(Storage::open(&config)?);
        if config.seed.enabled {
            storage.seed_wallets(&config.seed)?;
        }

        let metrics = Metrics::new()?;
        let engine = TransferEngine::new(
            storage.clone(),
            RetryPolicy::from(&config.engine),
            metrics.clone(),
        );
        let query = QueryService::new(storage.clone());

        Ok(Self {
            storage,
            engine,
            query,
            metrics,
            config,
        })
    }

    /// Validate and execute a transfer
    pub fn make_transaction(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<TransactionRecord> {
        let from = WalletAddress::new(from);
        let to = WalletAddress::new(to);

        if let Err(err) = validate_transfer(&from, &to, amount) {
            tracing::warn!(from = %from, to = %to, amount = %amount, error = %err, "Transfer rejected");
            self.metrics.record_failure(err.kind());
            return Err(err);
        }

        tracing::info!(from = %from, to = %to, amount = %amount, "Transaction initialized");

        let started = Instant::now();
        match self.engine.transfer(&from, &to, amount) {
            Ok(record) => {
                self.metrics
                    .record_transfer(started.elapsed().as_secs_f64());
                tracing::info!(
                    from = %from,
                    to = %to,
                    amount = %amount,
                    sequence = record.sequence,
                    "Transaction completed"
                );
                Ok(record)
            }
            Err(err) => {
                self.metrics.record_failure(err.kind());
                match &err {
                    Error::Internal => {}
                    Error::WalletNotFound(missing) => tracing::warn!(
                        from = %from,
                        to = %to,
                        amount = %amount,
                        address = %missing,
                        error = %err,
                        "Transaction failed"
                    ),
                    _ => tracing::warn!(from = %from, to = %to, amount = %amount, error = %err, "Transaction failed"),
                }
                Err(err)
            }
        }
    }

    /// Balance of one wallet
    pub fn get_balance(&self, address: &str) -> Result<Decimal> {
        let address = WalletAddress::new(address);
        let balance = self.query.balance(&address).map_err(|err| {
            if let Error::WalletNotFound(missing) = &err {
                tracing::warn!(address = %missing, "Balance requested for unknown wallet");
            }
            err
        })?;
        tracing::debug!(address = %address, balance = %balance, "Get balance");
        Ok(balance)
    }

    /// Up to `n` most recent transfers, newest first
    pub fn get_recent_transactions(&self, n: i64) -> Result<Vec<TransactionRecord>> {
        let records = self.query.recent_transactions(n).map_err(|err| {
            if err.is_validation() {
                tracing::warn!(count = n, "Invalid history limit");
            }
            err
        })?;
        tracing::debug!(count = n, returned = records.len(), "Get recent transactions");
        Ok(records)
    }

    /// Sum of every wallet balance
    pub fn total_balance(&self) -> Result<Decimal> {
        self.query.total_balance()
    }

    /// Create a wallet outside the transfer path (bootstrap and fixtures)
    pub fn create_wallet(
        &self,
        address: &str,
        balance: Decimal,
    ) -> std::result::Result<Wallet, StoreError> {
        self.storage.create_wallet(&WalletAddress::new(address), balance)
    }

    /// All wallets
    pub fn wallets(&self) -> Result<Vec<Wallet>> {
        self.storage
            .wallets()
            .map_err(|e| Error::internal("wallets", &e))
    }

    /// Transfer metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration the ledger was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown ledger, closing the store
    pub fn close(self) -> std::result::Result<(), StoreError> {
        let Self {
            storage,
            engine,
            query,
            ..
        } = self;
        drop(engine);
        drop(query);

        match Arc::try_unwrap(storage) {
            Ok(storage) => storage.close(),
            Err(_) => {
                tracing::warn!("Store still shared at shutdown; closing on last drop");
                Ok(())
            }
        }
    }
}
