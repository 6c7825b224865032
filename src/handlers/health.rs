// src/handlers/health.rs

use axum::{Json, response::IntoResponse};

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
