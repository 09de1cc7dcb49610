//! Backend status and switching routes

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::core::error::TtsError;
use crate::profiles::BackendKind;
use crate::server::state::AppState;
use crate::server::types::{BackendStatus, BackendSwitchRequest, BackendsResponse};

/// GET /v1/backends
pub async fn list_backends(State(state): State<Arc<AppState>>) -> Json<BackendsResponse> {
    let default = state.router.default_backend();
    let backends = state
        .router
        .adapters()
        .iter()
        .map(|adapter| BackendStatus {
            name: adapter.kind().as_str(),
            available: adapter.health.availability(),
            consecutive_failures: adapter.health.consecutive_failures(),
            default: adapter.kind() == default,
        })
        .collect();
    Json(BackendsResponse {
        backends,
        default: default.as_str(),
    })
}

/// POST /v1/backends/switch
pub async fn switch_backend(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BackendSwitchRequest>,
) -> Result<Json<serde_json::Value>, TtsError> {
    let kind = BackendKind::parse(&request.backend).ok_or_else(|| TtsError::InvalidRequest {
        message: format!("unknown backend '{}'", request.backend),
    })?;
    if !state.router.set_default(kind) {
        return Err(TtsError::InvalidRequest {
            message: format!("backend '{}' is not registered", request.backend),
        });
    }
    Ok(Json(json!({ "status": "ok", "default": kind.as_str() })))
}
