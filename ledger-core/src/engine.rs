//! Transfer engine
//!
//! Runs one transfer as a single unit of work:
//!
//! ```text
//! begin
//!   lock wallet rows (ascending address order)
//!   from exists?          -> WalletNotFound
//!   balance(from) >= amt? -> InsufficientFunds
//!   to exists?            -> WalletNotFound
//!   debit from, credit to
//!   lock sequence, append record
//! commit
//! ```
//!
//! Every transfer takes its locks in the same global order (wallets sorted
//! by address, then the log sequence), so two transfers can wait on each
//! other but never deadlock. Lock timeouts are retried with backoff.

use crate::{
    config::EngineConfig,
    error::StoreError,
    metrics::Metrics,
    storage::Storage,
    types::{TransactionRecord, WalletAddress},
    Error, Result,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Why a single attempt ended without committing
#[derive(Debug)]
enum Abort {
    Domain(Error),
    Store(StoreError),
}

impl From<StoreError> for Abort {
    fn from(err: StoreError) -> Self {
        Abort::Store(err)
    }
}

/// Exponential backoff with jitter between conflicting attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Delay cap
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based)
    fn delay(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64 * 2f64.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        // 10% jitter spreads retries of transfers that collided together
        let jitter = (rand::random::<f64>() - 0.5) * capped * 0.2;
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }
}

impl From<&EngineConfig> for RetryPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }
}

/// Sole mutator of wallet balances
#[derive(Debug)]
pub struct TransferEngine {
    storage: Arc<Storage>,
    retry: RetryPolicy,
    metrics: Metrics,
}

impl TransferEngine {
    /// Create engine over a shared store
    pub fn new(storage: Arc<Storage>, retry: RetryPolicy, metrics: Metrics) -> Self {
        Self {
            storage,
            retry,
            metrics,
        }
    }

    /// Move `amount` from one wallet to another atomically.
    ///
    /// Callers validate the request first; see [`crate::validation`].
    pub fn transfer(
        &self,
        from: &WalletAddress,
        to: &WalletAddress,
        amount: Decimal,
    ) -> Result<TransactionRecord> {
        let mut attempt = 0;
        loop {
            match self.try_transfer(from, to, amount) {
                Ok(record) => return Ok(record),
                Err(Abort::Domain(err)) => return Err(err),
                Err(Abort::Store(err)) if err.is_conflict() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    self.metrics.record_retry();
                    tracing::warn!(
                        from = %from,
                        to = %to,
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Lock conflict, retrying transfer"
                    );
                    std::thread::sleep(delay);
                }
                Err(Abort::Store(err)) if err.is_conflict() => {
                    return Err(Error::internal(
                        "transfer",
                        &StoreError::RetriesExhausted(attempt + 1),
                    ));
                }
                Err(Abort::Store(err)) => return Err(Error::internal("transfer", &err)),
            }
        }
    }

    fn try_transfer(
        &self,
        from: &WalletAddress,
        to: &WalletAddress,
        amount: Decimal,
    ) -> std::result::Result<TransactionRecord, Abort> {
        let uow = self.storage.begin();

        let (from_balance, to_balance) = if from <= to {
            let from_balance = uow.lock_wallet(from)?;
            (from_balance, uow.lock_wallet(to)?)
        } else {
            let to_balance = uow.lock_wallet(to)?;
            (uow.lock_wallet(from)?, to_balance)
        };

        let available =
            from_balance.ok_or_else(|| Abort::Domain(Error::WalletNotFound(from.clone())))?;

        if available < amount {
            return Err(Abort::Domain(Error::InsufficientFunds {
                address: from.clone(),
                available,
                requested: amount,
            }));
        }

        let to_balance =
            to_balance.ok_or_else(|| Abort::Domain(Error::WalletNotFound(to.clone())))?;

        let credited = to_balance
            .checked_add(amount)
            .ok_or_else(|| StoreError::Overflow(to.clone()))?;

        uow.set_balance(from, available - amount)?;
        uow.set_balance(to, credited)?;

        let record = uow.append_record(from, to, amount)?;
        uow.commit()?;

        Ok(record)
    }
}
