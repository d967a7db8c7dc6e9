//! Error types for the ledger
//!
//! Two layers:
//!
//! - [`StoreError`]: infrastructure failures inside the store (RocksDB,
//!   serialization, configuration). Never crosses the public API of the
//!   engine or query layer.
//! - [`Error`]: the closed set of kinds every ledger operation reports.

use crate::types::WalletAddress;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger operation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Transfer amount or history limit is not positive
    #[error("amount must be positive")]
    InvalidAmount,

    /// Source and destination are the same wallet
    #[error("cannot send money to yourself")]
    SelfTransfer,

    /// Wallet does not exist; the address is logged, not displayed
    #[error("wallet not found")]
    WalletNotFound(WalletAddress),

    /// Source balance is below the requested amount
    #[error("insufficient funds")]
    InsufficientFunds {
        /// Debited wallet
        address: WalletAddress,
        /// Balance at the time of the check
        available: Decimal,
        /// Requested transfer amount
        requested: Decimal,
    },

    /// Infrastructure failure; details are logged, not returned
    #[error("internal error")]
    Internal,
}

impl Error {
    /// Stable tag for boundary mapping and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidAmount => "invalid_amount",
            Error::SelfTransfer => "self_transfer",
            Error::WalletNotFound(_) => "wallet_not_found",
            Error::InsufficientFunds { .. } => "insufficient_funds",
            Error::Internal => "internal_error",
        }
    }

    /// Rejected before any store access
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidAmount | Error::SelfTransfer)
    }

    /// Translate an infrastructure failure, logging the detail.
    pub(crate) fn internal(operation: &'static str, err: &StoreError) -> Self {
        tracing::error!(operation, error = %err, "ledger store failure");
        Error::Internal
    }
}

/// Infrastructure errors raised by the store
#[derive(Error, Debug)]
pub enum StoreError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Column family missing from an opened database
    #[error("Column family {0} not found")]
    MissingColumnFamily(&'static str),

    /// Stored bytes do not decode
    #[error("Corrupt value for key {key}: {reason}")]
    Corrupt {
        /// Key whose value failed to decode
        key: String,
        /// Decoding failure
        reason: String,
    },

    /// Decimal arithmetic overflowed
    #[error("Balance overflow for wallet {0}")]
    Overflow(WalletAddress),

    /// Bootstrap tried to create an existing wallet
    #[error("Wallet already exists: {0}")]
    WalletExists(WalletAddress),

    /// Bootstrap tried to create a wallet with a negative balance
    #[error("Negative opening balance for wallet {0}")]
    NegativeBalance(WalletAddress),

    /// Lock conflicts persisted through every retry
    #[error("Transfer retries exhausted after {0} attempts")]
    RetriesExhausted(u32),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Transient lock contention; the unit of work may be retried
    pub fn is_conflict(&self) -> bool {
        match self {
            StoreError::RocksDb(err) => matches!(
                err.kind(),
                rocksdb::ErrorKind::Busy
                    | rocksdb::ErrorKind::TimedOut
                    | rocksdb::ErrorKind::TryAgain
            ),
            _ => false,
        }
    }
}
