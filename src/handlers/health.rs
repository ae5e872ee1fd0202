use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Handle /health endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "protocol_version": crate::payload::PROTOCOL_VERSION,
        })),
    )
}
