//! Unified error handling for the HTTP surface.
//!
//! Every per-request condition except an unreachable allowlist is folded into
//! a routing outcome by the decision service, so this type stays small.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared_types::ErrorResponse;
use thiserror::Error;

use crate::allowlist::LookupError;
use crate::services::decision::DecideError;

/// Seconds a client is asked to wait after an allowlist outage
pub const RETRY_AFTER_SECS: u64 = 30;

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// The allowlist store could not be reached or answered badly
    #[error("Allowlist unavailable: {0}")]
    LookupUnavailable(#[source] LookupError),

    /// A decision token could not be signed
    #[error("Token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DecideError> for ApiError {
    fn from(err: DecideError) -> Self {
        match err {
            DecideError::Lookup(e) => ApiError::LookupUnavailable(e),
            DecideError::Signing(e) => ApiError::Signing(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::LookupUnavailable(e) => {
                tracing::error!("Allowlist lookup error: {}", e);
                let body = Json(ErrorResponse::new(
                    "Allowlist lookup unavailable",
                    Some("Please retry later".to_string()),
                ));
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    [(header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())],
                    body,
                )
                    .into_response()
            }
            ApiError::Signing(e) => {
                tracing::error!("Token signing error: {:?}", e);
                internal_error()
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", None)),
    )
        .into_response()
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
