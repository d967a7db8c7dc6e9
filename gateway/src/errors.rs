//! HTTP error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use wallet_ledger::Error as LedgerError;

/// Result type for handlers
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failures a handler can return
#[derive(Error, Debug)]
pub enum ApiError {
    /// Body is not valid JSON for the request type
    #[error("invalid request body")]
    InvalidBody,

    /// `count` query parameter missing or not an integer
    #[error("invalid count")]
    InvalidCount,

    /// Ledger operation failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Gateway-side failure (join error, metrics export)
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// HTTP status for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody | ApiError::InvalidCount => StatusCode::BAD_REQUEST,
            ApiError::Ledger(err) if err.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::WalletNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Ledger(LedgerError::InsufficientFunds { .. }) => StatusCode::PAYMENT_REQUIRED,
            ApiError::Ledger(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::InvalidBody
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wallet_ledger::WalletAddress;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::InvalidBody, StatusCode::BAD_REQUEST),
            (ApiError::InvalidCount, StatusCode::BAD_REQUEST),
            (LedgerError::InvalidAmount.into(), StatusCode::BAD_REQUEST),
            (LedgerError::SelfTransfer.into(), StatusCode::BAD_REQUEST),
            (
                LedgerError::WalletNotFound(WalletAddress::new("ghost")).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                LedgerError::InsufficientFunds {
                    address: WalletAddress::new("a"),
                    available: dec!(1),
                    requested: dec!(2),
                }
                .into(),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (LedgerError::Internal.into(), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn test_internal_message_has_no_detail() {
        assert_eq!(ApiError::from(LedgerError::Internal).to_string(), "internal error");
        assert_eq!(ApiError::Internal.to_string(), "internal error");
    }
}
