//! Error types for the sync web surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum WebError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// Sync engine error.
    #[error("Sync error: {0}")]
    Sync(#[from] sync_engine::SyncError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let message = match &self {
            WebError::Database(err) => {
                tracing::error!("Database error: {}", err);
                err.to_string()
            }
            WebError::Sync(err) => {
                tracing::error!("Sync error: {}", err);
                err.to_string()
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, WebError>;
