//! Read-only balance and history lookups

use crate::{
    storage::Storage,
    types::{TransactionRecord, WalletAddress},
    validation::validate_limit,
    Error, Result,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Query layer over the shared store
#[derive(Debug, Clone)]
pub struct QueryService {
    storage: Arc<Storage>,
}

impl QueryService {
    /// Create query layer over a shared store
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Committed balance of one wallet
    pub fn balance(&self, address: &WalletAddress) -> Result<Decimal> {
        self.storage
            .balance(address)
            .map_err(|e| Error::internal("get_balance", &e))?
            .ok_or_else(|| Error::WalletNotFound(address.clone()))
    }

    /// At most `n` records, most recent commit first
    pub fn recent_transactions(&self, n: i64) -> Result<Vec<TransactionRecord>> {
        let limit = validate_limit(n)?;
        self.storage
            .recent_transactions(limit)
            .map_err(|e| Error::internal("get_recent_transactions", &e))
    }

    /// Sum of every wallet balance
    pub fn total_balance(&self) -> Result<Decimal> {
        self.storage
            .total_balance()
            .map_err(|e| Error::internal("total_balance", &e))
    }
}
