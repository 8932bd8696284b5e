//! API Error Handling
//!
//! Structured error responses with proper HTTP status codes and request tracking.

use crate::errors::{LedgerError, SettlementError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

/// Error body with structured information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code (INSUFFICIENT_BALANCE, UNKNOWN_PLAYER, INTERNAL_ERROR, etc.)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Whether resubmitting the same request may succeed
    #[serde(default)]
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error types with request tracking
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
    /// Overrides the generic code derived from `kind`
    pub code: Option<&'static str>,
    pub retryable: bool,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    InternalError(String),
    ServiceUnavailable(String),
}

impl ApiError {
    fn new(kind: ApiErrorKind, request_id: String) -> Self {
        Self {
            kind,
            request_id,
            code: None,
            retryable: false,
            details: None,
        }
    }

    pub fn not_found(request_id: String, message: String) -> Self {
        Self::new(ApiErrorKind::NotFound(message), request_id)
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self::new(ApiErrorKind::BadRequest(message), request_id)
    }

    pub fn conflict(request_id: String, message: String) -> Self {
        Self::new(ApiErrorKind::Conflict(message), request_id)
    }

    pub fn internal_error(request_id: String, message: String) -> Self {
        Self::new(ApiErrorKind::InternalError(message), request_id)
    }

    pub fn service_unavailable(request_id: String, message: String) -> Self {
        let mut error = Self::new(ApiErrorKind::ServiceUnavailable(message), request_id);
        error.retryable = true;
        error
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Map a settlement failure to its HTTP status
    pub fn from_settlement(request_id: String, error: SettlementError) -> Self {
        let message = error.to_string();
        let code = error.code();

        let api_error = match &error {
            SettlementError::InsufficientBalance { required, available } => {
                Self::bad_request(request_id, message).with_details(serde_json::json!({
                    "required": required,
                    "available": available,
                }))
            }
            SettlementError::TooManyWagers { count, max } => Self::bad_request(request_id, message)
                .with_details(serde_json::json!({ "count": count, "max": max })),
            SettlementError::UnknownPlayer(_) => Self::not_found(request_id, message),
            SettlementError::AmountOverflow(_) => Self::bad_request(request_id, message),
            SettlementError::RollbackFailed { stake, .. } => Self::internal_error(request_id, message)
                .with_details(serde_json::json!({ "unreturned_stake": stake })),
            SettlementError::LedgerUnavailable(_)
            | SettlementError::RetriesExhausted { .. }
            | SettlementError::Aborted(_) => Self::service_unavailable(request_id, message),
        };

        api_error.with_code(code)
    }

    /// Map an account operation failure to its HTTP status
    pub fn from_ledger(request_id: String, error: LedgerError) -> Self {
        let message = error.to_string();
        match error {
            LedgerError::AccountNotFound(_) => {
                Self::not_found(request_id, message).with_code("UNKNOWN_PLAYER")
            }
            LedgerError::AccountExists(_) => {
                Self::conflict(request_id, message).with_code("ACCOUNT_EXISTS")
            }
            LedgerError::InvalidAmount(_)
            | LedgerError::NegativeBalance { .. }
            | LedgerError::Overflow { .. } => {
                Self::bad_request(request_id, message).with_code("INVALID_AMOUNT")
            }
            LedgerError::ConcurrentModification { .. } => {
                Self::service_unavailable(request_id, message).with_code("LEDGER_CONFLICT")
            }
            LedgerError::Unavailable(_) => {
                Self::service_unavailable(request_id, message).with_code("LEDGER_UNAVAILABLE")
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ApiErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            ApiErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiErrorKind::Conflict(_) => StatusCode::CONFLICT,
            ApiErrorKind::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorKind::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn default_code(&self) -> &'static str {
        match self.kind {
            ApiErrorKind::NotFound(_) => "NOT_FOUND",
            ApiErrorKind::BadRequest(_) => "BAD_REQUEST",
            ApiErrorKind::Conflict(_) => "CONFLICT",
            ApiErrorKind::InternalError(_) => "INTERNAL_ERROR",
            ApiErrorKind::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    fn message(&self) -> &str {
        match &self.kind {
            ApiErrorKind::NotFound(msg)
            | ApiErrorKind::BadRequest(msg)
            | ApiErrorKind::Conflict(msg)
            | ApiErrorKind::InternalError(msg)
            | ApiErrorKind::ServiceUnavailable(msg) => msg,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::NotFound(msg) => write!(f, "[{}] Not Found: {}", self.request_id, msg),
            ApiErrorKind::BadRequest(msg) => write!(f, "[{}] Bad Request: {}", self.request_id, msg),
            ApiErrorKind::Conflict(msg) => write!(f, "[{}] Conflict: {}", self.request_id, msg),
            ApiErrorKind::InternalError(msg) => write!(f, "[{}] Internal Error: {}", self.request_id, msg),
            ApiErrorKind::ServiceUnavailable(msg) => write!(f, "[{}] Service Unavailable: {}", self.request_id, msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            request_id: self.request_id.clone(),
            error: ErrorBody {
                code: self.code.unwrap_or_else(|| self.default_code()).to_string(),
                message: self.message().to_string(),
                retryable: self.retryable,
                details: self.details.clone(),
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::PlayerId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_settlement_status_mapping() {
        let cases = [
            (
                SettlementError::InsufficientBalance {
                    required: dec!(15),
                    available: dec!(10),
                },
                StatusCode::BAD_REQUEST,
            ),
            (SettlementError::TooManyWagers { count: 3, max: 2 }, StatusCode::BAD_REQUEST),
            (SettlementError::UnknownPlayer(PlayerId::from("x")), StatusCode::NOT_FOUND),
            (SettlementError::AmountOverflow("win".into()), StatusCode::BAD_REQUEST),
            (SettlementError::LedgerUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (SettlementError::RetriesExhausted { attempts: 3 }, StatusCode::SERVICE_UNAVAILABLE),
            (
                SettlementError::RollbackFailed {
                    player: PlayerId::from("x"),
                    stake: dec!(5),
                    reason: "down".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            let code = error.code();
            let api_error = ApiError::from_settlement("req-1".into(), error);
            assert_eq!(api_error.status(), status);
            assert_eq!(api_error.code, Some(code));
        }
    }

    #[test]
    fn test_retryable_flag_follows_service_errors() {
        let unavailable = ApiError::from_settlement(
            "req-2".into(),
            SettlementError::LedgerUnavailable("down".into()),
        );
        let rejected = ApiError::from_settlement(
            "req-3".into(),
            SettlementError::UnknownPlayer(PlayerId::from("ghost")),
        );
        assert!(unavailable.retryable);
        assert!(!rejected.retryable);
    }

    #[test]
    fn test_ledger_error_mapping() {
        let exists = ApiError::from_ledger("r".into(), LedgerError::AccountExists(PlayerId::from("a")));
        assert_eq!(exists.status(), StatusCode::CONFLICT);
        let amount = ApiError::from_ledger("r".into(), LedgerError::InvalidAmount(dec!(0)));
        assert_eq!(amount.status(), StatusCode::BAD_REQUEST);
    }
}
