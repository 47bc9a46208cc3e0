//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps gateway, mirror and validation errors to HTTP status codes with a
//! JSON body of error code, message and optional details.
//!
//! | Source                                  | Status |
//! |-----------------------------------------|--------|
//! | `GatewayError::CallFailed`              | 502, relay message verbatim |
//! | `GatewayError::ConfirmationTimeout`     | 504    |
//! | `GatewayError::Cancelled`               | 409    |
//! | `GatewayError::Transport`               | 503    |
//! | `GatewayError::Malformed`               | 502    |
//! | `ValidationError`, invalid JSON fields  | 422    |
//! | unknown session                         | 404    |
//!
//! Internal error details are logged and never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ccon_gateway::GatewayError;
use ccon_ledger::MirrorError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONTRACT_CALL_FAILED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, present only for some client and upstream errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict with current session or contract state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The contract rejected or reverted the call (502). Displays the
    /// relay's message exactly as received.
    #[error("{message}")]
    ContractCall { function: String, message: String },

    /// An upstream answered with something unusable (502).
    #[error("bad upstream response: {0}")]
    Upstream(String),

    /// An upstream could not be reached (503).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A transaction was not confirmed in time (504).
    #[error("{0}")]
    ConfirmationTimeout(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ContractCall { .. } => (StatusCode::BAD_GATEWAY, "CONTRACT_CALL_FAILED"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "BAD_UPSTREAM_RESPONSE"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::ConfirmationTimeout(_) => {
                (StatusCode::GATEWAY_TIMEOUT, "CONFIRMATION_TIMEOUT")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::ContractCall { function, .. } => {
                Some(serde_json::json!({ "function": function }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::CallFailed { function, message } => {
                Self::ContractCall { function, message }
            }
            GatewayError::ConfirmationTimeout { .. } => Self::ConfirmationTimeout(err.to_string()),
            GatewayError::Cancelled { .. } => Self::Conflict(err.to_string()),
            GatewayError::Transport { .. } => Self::Unavailable(err.to_string()),
            GatewayError::Malformed { .. } => Self::Upstream(err.to_string()),
            GatewayError::Config(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<MirrorError> for AppError {
    fn from(err: MirrorError) -> Self {
        match err {
            MirrorError::Gateway { source, .. } | MirrorError::Unconfirmed { source, .. } => {
                source.into()
            }
            MirrorError::ContentStore { ref source, .. } if source.is_unavailable() => {
                Self::Unavailable(err.to_string())
            }
            MirrorError::PointerMoved { .. } => Self::Conflict(err.to_string()),
            MirrorError::ContentStore { .. } | MirrorError::Format(_) => {
                Self::Upstream(err.to_string())
            }
        }
    }
}

impl From<ccon_core::ValidationError> for AppError {
    fn from(err: ccon_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
