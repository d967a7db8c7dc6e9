//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wallet identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Create new wallet address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for WalletAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}

/// Named balance holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Primary key
    pub address: WalletAddress,

    /// Current balance, never negative
    pub balance: Decimal,
}

/// Committed transfer in the append-only log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Position in the log; increases with commit order
    pub sequence: u64,

    /// Debited wallet
    pub from: WalletAddress,

    /// Credited wallet
    pub to: WalletAddress,

    /// Transferred amount (positive)
    pub amount: Decimal,

    /// Commit time
    pub timestamp: DateTime<Utc>,
}
