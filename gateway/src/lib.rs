//! HTTP boundary for the wallet ledger
//!
//! Routes JSON requests to [`wallet_ledger::Ledger`] and maps its error
//! kinds onto status codes. Holds no ledger state of its own.

#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod routes;

pub use config::{Config, RuntimeEnv};
pub use errors::ApiError;
pub use handlers::AppState;
pub use routes::router;
