//! Gateway Error Types
//!
//! This module provides the gateway's error taxonomy and its mapping onto
//! the unified `kernel::error::AppError` system.
//!
//! The distinct variants exist for logs. Clients only ever see one generic
//! message per category, so a forger learns nothing about which check failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::RateLimitStoreError;
use thiserror::Error;

/// Gateway result type alias
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error variants
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bearer token missing, malformed, forged or expired
    #[error("Invalid bearer token")]
    InvalidToken,

    /// Session cookie missing, malformed, unsigned or expired
    #[error("Invalid session")]
    InvalidSession,

    /// CSRF cookie or header is empty
    #[error("Missing CSRF token")]
    MissingCsrfToken,

    /// CSRF cookie or header failed its own signature check
    #[error("Invalid CSRF token signature")]
    InvalidCsrfSignature,

    /// Both CSRF tokens verify but carry different raw values
    #[error("CSRF token mismatch")]
    CsrfMismatch,

    /// Client exhausted its quota for the current window
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Token or session requested for an empty subject
    #[error("Subject must not be empty")]
    InvalidSubject,

    /// Rate limit backend failure
    #[error("Rate limit store error: {0}")]
    RateLimitStore(#[from] RateLimitStoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidToken | GatewayError::InvalidSession => StatusCode::UNAUTHORIZED,
            GatewayError::MissingCsrfToken
            | GatewayError::InvalidCsrfSignature
            | GatewayError::CsrfMismatch => StatusCode::FORBIDDEN,
            GatewayError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::InvalidSubject => StatusCode::BAD_REQUEST,
            GatewayError::RateLimitStore(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::InvalidToken | GatewayError::InvalidSession => ErrorKind::Unauthorized,
            GatewayError::MissingCsrfToken
            | GatewayError::InvalidCsrfSignature
            | GatewayError::CsrfMismatch => ErrorKind::Forbidden,
            GatewayError::RateLimitExceeded { .. } => ErrorKind::TooManyRequests,
            GatewayError::InvalidSubject => ErrorKind::BadRequest,
            GatewayError::RateLimitStore(_) | GatewayError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Whether this is one of the CSRF failures
    pub fn is_csrf_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::MissingCsrfToken
                | GatewayError::InvalidCsrfSignature
                | GatewayError::CsrfMismatch
        )
    }

    /// Message shown to the client (one per category)
    fn public_message(&self) -> &'static str {
        match self {
            GatewayError::InvalidToken => "Invalid or expired token",
            GatewayError::InvalidSession => "Invalid session",
            GatewayError::MissingCsrfToken
            | GatewayError::InvalidCsrfSignature
            | GatewayError::CsrfMismatch => "CSRF validation failed",
            GatewayError::RateLimitExceeded { .. } => "Rate limit exceeded",
            GatewayError::InvalidSubject => "Subject must not be empty",
            GatewayError::RateLimitStore(_) | GatewayError::Internal(_) => "Internal error",
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.public_message());
        match self {
            GatewayError::RateLimitExceeded { retry_after_secs } => {
                err.with_retry_after(*retry_after_secs)
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            GatewayError::RateLimitStore(e) => {
                tracing::error!(error = %e, "Rate limit store failure");
            }
            GatewayError::Internal(msg) => {
                tracing::error!(message = %msg, "Gateway internal error");
            }
            GatewayError::InvalidCsrfSignature | GatewayError::CsrfMismatch => {
                tracing::warn!(error = %self, "CSRF check failed");
            }
            GatewayError::RateLimitExceeded { retry_after_secs } => {
                tracing::info!(retry_after_secs, "Request throttled");
            }
            _ => {
                tracing::debug!(error = %self, "Request rejected");
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
