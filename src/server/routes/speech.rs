//! The speech endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use crate::core::error::TtsError;
use crate::pipeline::SynthesisRequest;
use crate::profiles::BackendKind;
use crate::server::state::AppState;
use crate::server::types::SpeechRequest;
use crate::text::word_count;

/// POST /v1/audio/speech
///
/// OpenAI-compatible synthesis. Returns raw audio bytes with the
/// matching content type, or a JSON error body.
pub async fn create_speech(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeechRequest>,
) -> Result<Response, TtsError> {
    let backend = match request.backend.as_deref() {
        Some(name) => Some(BackendKind::parse(name).ok_or_else(|| TtsError::InvalidRequest {
            message: format!("unknown backend '{name}'"),
        })?),
        None => None,
    };

    let request_id = uuid::Uuid::new_v4();
    // User text is never logged; only sizes
    info!(
        %request_id,
        voice = %request.voice,
        words = word_count(&request.input),
        chars = request.input.len(),
        format = %request.response_format,
        "speech request"
    );

    let output = state
        .pipeline
        .synthesize(&SynthesisRequest {
            text: request.input,
            voice: request.voice,
            format: request.response_format,
            speed: request.speed,
            backend,
        })
        .await?;

    info!(
        %request_id,
        backend = %output.backend,
        bytes = output.bytes.len(),
        "speech complete"
    );

    Ok((
        [(header::CONTENT_TYPE, output.format.content_type())],
        output.bytes,
    )
        .into_response())
}
