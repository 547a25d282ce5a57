//! Health check endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Service name reported by `/api/health`.
pub const SERVICE_NAME: &str = "guesty-insights-sync";

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    pub status: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check endpoint.
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

/// Database connectivity check; 500 when the store is unreachable.
pub async fn database_health(State(state): State<AppState>) -> (StatusCode, Json<DatabaseHealth>) {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(DatabaseHealth {
                status: "healthy",
                database: "connected",
                error: None,
            }),
        ),
        Err(err) => {
            tracing::warn!("Database health check failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DatabaseHealth {
                    status: "unhealthy",
                    database: "disconnected",
                    error: Some(err.to_string()),
                }),
            )
        }
    }
}
