//! Route handlers for the sync web surface.

pub mod health;
pub mod sync;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health checks
        .route("/api/health", get(health::health))
        .route("/api/health/db", get(health::database_health))
        // Sync API
        .route("/api/sync/trigger", post(sync::trigger))
        .route("/api/sync/status", get(sync::status))
}

#[cfg(test)]
pub(crate) mod test_client {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::state::AppState;

    /// Send one request through the router and decode the JSON reply.
    pub async fn call(state: AppState, method: Method, uri: &str) -> (StatusCode, Value) {
        let response = super::router()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }
}
