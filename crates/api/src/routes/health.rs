//! Service banner and health checks.

use axum::{Json, extract::State, http::StatusCode};

use super::MessageResponse;
use crate::state::AppState;

/// `GET /` and `GET /api`.
pub async fn banner() -> Json<MessageResponse> {
    Json(MessageResponse::new("Marketplace API is running"))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
