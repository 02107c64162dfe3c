//! HTTP-facing errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Errors a webhook handler can answer with.
#[derive(Debug)]
pub enum ApiError {
    /// The request body was not the JSON we expect.
    InvalidBody { reason: String },
    /// The webhook verification handshake did not match.
    VerificationFailed,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBody { reason } => write!(f, "invalid request body: {reason}"),
            Self::VerificationFailed => write!(f, "webhook verification failed"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            Self::VerificationFailed => StatusCode::FORBIDDEN,
        };
        tracing::warn!(error = %self, "webhook request rejected");
        (
            status,
            Json(json!({"status": "error", "message": self.to_string()})),
        )
            .into_response()
    }
}
