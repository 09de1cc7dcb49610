//! Voice catalog routes

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::server::state::AppState;
use crate::server::types::{VoiceInfo, VoicesResponse};

/// GET /v1/voices
pub async fn list_voices(State(state): State<Arc<AppState>>) -> Json<VoicesResponse> {
    let voices: Vec<VoiceInfo> = state
        .registry
        .all()
        .into_iter()
        .map(|voice| VoiceInfo {
            clone: voice.is_clone(),
            backend: voice.backend.map(|kind| kind.as_str()),
            category: voice.category,
            name: voice.name,
        })
        .collect();
    let count = voices.len();
    Json(VoicesResponse { voices, count })
}

/// POST /v1/voices/refresh
///
/// Re-scan the clone directory and re-query backend catalogs.
pub async fn refresh_voices(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let count = state.reload_voices().await;
    Json(json!({ "status": "ok", "voice_count": count }))
}
