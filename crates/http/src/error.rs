//! Error handling for the Folio HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Generic message returned when the upstream catalog misbehaves.
/// Upstream bodies are never forwarded to callers.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Error fetching data from the book catalog";

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Vec<serde_json::Value>,
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        code: String,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error("method not allowed: {message}")]
    MethodNotAllowed { message: String, code: String },

    /// Upstream answered with a non-success status; the caller gets the same status.
    #[error("upstream returned {status}")]
    Upstream { status: StatusCode, code: String },

    #[error("bad gateway: {message}")]
    BadGateway { message: String, code: String },

    #[error("gateway timeout: {message}")]
    GatewayTimeout { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    /// Create a method not allowed error
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            message: message.into(),
            code: "method_not_allowed".to_string(),
        }
    }

    /// Pass an upstream status code through to the caller
    pub fn upstream(status: StatusCode) -> Self {
        Self::Upstream {
            status,
            code: "upstream_error".to_string(),
        }
    }

    /// Upstream was unreachable or sent an unusable body
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::BadGateway {
            message: message.into(),
            code: "bad_gateway".to_string(),
        }
    }

    /// Upstream did not answer in time
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::GatewayTimeout {
            message: message.into(),
            code: "gateway_timeout".to_string(),
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Upstream { status, .. } => *status,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc().to_string();
        let status = self.status();
        let is_internal = matches!(self, AppError::Internal(_));

        let (error_code, message, details) = match self {
            AppError::Validation {
                details,
                code,
                message,
            } => (code, message, details),
            AppError::NotFound { message, code }
            | AppError::BadRequest { message, code }
            | AppError::MethodNotAllowed { message, code } => (code, message, Vec::new()),
            AppError::Upstream { code, .. } => {
                (code, UPSTREAM_FAILURE_MESSAGE.to_string(), Vec::new())
            }
            AppError::BadGateway { message, code } | AppError::GatewayTimeout { message, code } => {
                tracing::warn!(error_id = %error_id, %message, "upstream failure");
                (code, UPSTREAM_FAILURE_MESSAGE.to_string(), Vec::new())
            }
            AppError::Internal(e) => ("internal_error".to_string(), e.to_string(), Vec::new()),
        };

        tracing::error!(
            error_id = %error_id,
            error_code = %error_code,
            status_code = %status.as_u16(),
            "Request error"
        );

        // Internal details stay out of release builds
        let message = if cfg!(not(debug_assertions)) && is_internal {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let envelope = ErrorEnvelope {
            error: ErrorBody {
                code: error_code,
                message,
                details,
                trace_id: error_id.to_string(),
                timestamp,
            },
        };

        (status, Json(envelope)).into_response()
    }
}
