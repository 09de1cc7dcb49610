//! Model listing route (OpenAI compatibility)

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::server::state::AppState;
use crate::server::types::{ModelInfo, ModelsResponse};

/// GET /v1/models
///
/// Static OpenAI-shaped entries plus one id per registered backend.
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let mut data = vec![
        ModelInfo {
            id: "tts-1".to_string(),
            object: "model",
            owned_by: "unified-tts",
        },
        ModelInfo {
            id: "tts-1-hd".to_string(),
            object: "model",
            owned_by: "unified-tts",
        },
    ];
    for adapter in state.router.adapters() {
        data.push(ModelInfo {
            id: adapter.kind().as_str().to_string(),
            object: "model",
            owned_by: "unified-tts",
        });
    }
    Json(ModelsResponse {
        object: "list",
        data,
    })
}
