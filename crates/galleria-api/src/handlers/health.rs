//! Liveness check.

use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

/// Report liveness and the active store backend.
///
/// # Returns
/// - 200 OK with `{ "status": "ok", "version": ..., "backend": ... }`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.backend,
    }))
}
