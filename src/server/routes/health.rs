//! Health and status routes

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::server::state::AppState;

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    if state.router.adapters().is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": "no backend registered" })),
        )
            .into_response();
    }
    Json(json!({
        "status": "ok",
        "backend": state.router.default_backend().as_str(),
    }))
    .into_response()
}

/// GET /
///
/// Human-facing status page listing the endpoints.
pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "unified-tts",
        "version": env!("CARGO_PKG_VERSION"),
        "default_backend": state.router.default_backend().as_str(),
        "voice_count": state.registry.count(),
        "uptime_secs": state.uptime().as_secs(),
        "endpoints": {
            "speech": "POST /v1/audio/speech",
            "voices": "GET /v1/voices",
            "models": "GET /v1/models",
            "backends": "GET /v1/backends",
            "voice_prefs": "GET /v1/voice-prefs",
            "health": "GET /health",
        },
    }))
}
