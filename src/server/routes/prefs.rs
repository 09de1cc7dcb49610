//! Voice preference routes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::core::error::TtsError;
use crate::profiles::BackendKind;
use crate::server::state::AppState;
use crate::server::types::VoicePrefRequest;

/// GET /v1/voice-prefs
pub async fn get_prefs(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let preferences: serde_json::Map<String, serde_json::Value> = state
        .prefs
        .all()
        .into_iter()
        .map(|(voice, backend)| (voice, json!(backend.as_str())))
        .collect();
    Json(json!({ "preferences": preferences }))
}

/// POST /v1/voice-prefs/:voice
pub async fn set_pref(
    State(state): State<Arc<AppState>>,
    Path(voice): Path<String>,
    Json(request): Json<VoicePrefRequest>,
) -> Result<Json<serde_json::Value>, TtsError> {
    let kind = BackendKind::parse(&request.backend).ok_or_else(|| TtsError::InvalidRequest {
        message: format!("unknown backend '{}'", request.backend),
    })?;
    state.prefs.set(&voice, kind);
    Ok(Json(
        json!({ "status": "ok", "voice": voice, "backend": kind.as_str() }),
    ))
}

/// DELETE /v1/voice-prefs/:voice
pub async fn delete_pref(
    State(state): State<Arc<AppState>>,
    Path(voice): Path<String>,
) -> Json<serde_json::Value> {
    let removed = state.prefs.remove(&voice);
    Json(json!({ "status": "ok", "removed": removed }))
}
