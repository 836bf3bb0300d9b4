//! Application error taxonomy and its HTTP mapping
//!
//! Every failure a handler can surface goes through [`AppError`] so that the
//! wire shape is always `{"error": "..."}` and internal driver messages never
//! cross the trust boundary verbatim.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced by the resolution engine and auth gateway.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or missing input. Rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    /// Duplicate email on registration.
    #[error("email already exists")]
    EmailConflict,

    /// The bounded collision-retry budget was exhausted.
    #[error("collision")]
    CollisionExhausted,

    /// Missing, invalid or expired credentials. The message never
    /// distinguishes which, to avoid oracle leakage.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An endpoint that requires identity was called anonymously.
    #[error("authentication required")]
    AuthRequired,

    /// Unknown or expired code.
    #[error("not found")]
    NotFound,

    /// The durable store failed. The inner error is logged, not exposed.
    #[error("store error")]
    Store(#[from] StoreError),

    /// Anything else that should never happen in a healthy process. The
    /// detail is logged, not exposed.
    #[error("internal error")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::EmailConflict => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::AuthRequired => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::CollisionExhausted | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(ref err) => tracing::error!(error = %err, "store failure"),
            Self::Internal(ref detail) => tracing::error!(detail = %detail, "internal failure"),
            _ => {}
        }
        let body = json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Failures of the durable mapping store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<redb::Error> for StoreError {
    fn from(err: redb::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// Failures of the cache layer. Always absorbed by the engine; a cache error
/// and a cache miss look identical to callers.
#[derive(Debug, thiserror::Error)]
#[error("cache error: {0}")]
pub struct CacheError(pub String);
