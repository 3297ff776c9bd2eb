//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /health — Liveness plus a round trip to the notification store.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let (status, store) = match state.notifications.check_store().await {
        Ok(()) => (StatusCode::OK, "up"),
        Err(e) => {
            tracing::warn!(error = %e, "Notification store unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };

    let body = json!({
        "status": if status == StatusCode::OK { "ok" } else { "degraded" },
        "service": "herald-api",
        "version": env!("CARGO_PKG_VERSION"),
        "store": store,
    });
    (status, Json(body))
}
