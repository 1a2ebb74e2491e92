//! Centralized error types for tgstash.
//!
//! Uses `thiserror` for ergonomic error definitions and provides HTTP-friendly
//! error variants that can be directly converted to API responses.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Core application error type returned by every handler.
#[derive(Debug, thiserror::Error)]
pub enum StashError {
    // === Client input ===
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    PayloadTooLarge { message: String },

    // === Auth ===
    #[error("Unauthorized")]
    Unauthorized,

    // === Resources ===
    #[error("Not Found")]
    NotFound,

    // === Upstream (Telegram) ===
    /// The file could not be fetched back from the hosting API.
    #[error("Upstream Error")]
    BadGateway,

    /// The hosting API rejected or mangled an upload.
    #[error("{0}")]
    Upstream(String),

    // === Infrastructure ===
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body sent to clients.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl StashError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StashError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            StashError::Unauthorized => {
                let mut response = (status, "Unauthorized").into_response();
                let headers = response.headers_mut();
                headers.insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Basic realm=\"admin\""),
                );
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
                return response;
            }
            StashError::NotFound | StashError::BadGateway => {
                return (status, self.to_string()).into_response();
            }
            StashError::Upstream(message) => {
                tracing::warn!("Upstream error: {message}");
            }
            StashError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results using StashError.
pub type StashResult<T> = Result<T, StashError>;
