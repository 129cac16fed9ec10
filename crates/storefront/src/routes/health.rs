//! Health check route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

/// Readiness payload, including the swallowed-sync-failure counter so
/// operators can spot vendor/CMS drift without log access.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub swallowed_sync_failures: u64,
}

/// Liveness check.
///
/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// Readiness check. Fails until the CMS answers a trivial query.
///
/// GET /health/ready
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let swallowed_sync_failures = state.sync().metrics().swallowed();
    match state.cms().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready",
                swallowed_sync_failures,
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, swallowed_sync_failures, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "unready",
                    swallowed_sync_failures,
                }),
            )
        }
    }
}
