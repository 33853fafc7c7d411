//! Typed API error. Every service operation fails with one of these kinds;
//! the HTTP layer maps them onto status codes with a JSON error envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing required sharing info, unresolvable collaborator emails,
    /// malformed input.
    #[error("{0}")]
    BadRequest(String),

    /// Token missing, invalid, expired, or its subject no longer exists.
    #[error("Invalid or expired token")]
    Unauthorized,

    /// Authorization failed for a record the caller can see.
    #[error("{0}")]
    Forbidden(&'static str),

    /// Record or referenced assignee/collaborator absent. For note reads
    /// this also covers access denial, so existence never leaks.
    #[error("{0}")]
    NotFound(&'static str),

    /// Unique constraint hit (duplicate email).
    #[error("{0}")]
    Conflict(&'static str),

    /// Anything the client cannot fix. Logged, body redacted.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string())
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.to_string()),
            ApiError::Internal(err) => {
                error!("internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for service and handler results
pub type ApiResult<T> = Result<T, ApiError>;

/// Maps a panicked or cancelled blocking task into an API error.
pub(crate) fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {}", e);
    ApiError::Internal(anyhow::anyhow!(e))
}
