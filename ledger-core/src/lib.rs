//! Wallet Ledger Core
//!
//! Atomic value transfers between named wallets, backed by an embedded
//! RocksDB transaction store.
//!
//! # Architecture
//!
//! - **Validation**: Structurally invalid requests never reach the store
//! - **Unit of Work**: Every transfer is one pessimistic RocksDB transaction
//! - **Row Locks**: Wallet rows are locked in address order, then the log sequence
//! - **Append-only Log**: Committed transfers only, keyed by commit sequence
//!
//! # Invariants
//!
//! - Money conservation: Σ(balances) is unchanged by any transfer
//! - No overdraft: every balance stays >= 0
//! - Atomicity: a failed transfer changes no balance and writes no record
//! - Ordering: log sequence order equals commit order

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod query;
pub mod storage;
pub mod types;
pub mod validation;

// Re-exports
pub use config::Config;
pub use error::{Error, Result, StoreError};
pub use ledger::Ledger;
pub use types::{TransactionRecord, Wallet, WalletAddress};
