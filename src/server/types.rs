//! HTTP request and response types
//!
//! The speech endpoint mirrors the OpenAI audio API shape so existing
//! clients work unchanged. Pipeline errors convert into short JSON
//! error bodies with the status each kind dictates.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::adapters::Availability;
use crate::audio::AudioFormat;
use crate::core::error::TtsError;

/// OpenAI-compatible speech request
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    /// Accepted for compatibility; not semantically used
    #[serde(default = "default_model")]
    pub model: String,

    /// Text to synthesize
    pub input: String,

    /// Voice identifier
    pub voice: String,

    /// Output container
    #[serde(default)]
    pub response_format: AudioFormat,

    /// Playback speed in [0.25, 4.0]
    #[serde(default)]
    pub speed: Option<f32>,

    /// Explicit backend override (gateway extension)
    #[serde(default)]
    pub backend: Option<String>,
}

fn default_model() -> String {
    "tts-1".to_string()
}

/// Request to switch the default backend
#[derive(Debug, Deserialize)]
pub struct BackendSwitchRequest {
    pub backend: String,
}

/// Request to set one voice preference
#[derive(Debug, Deserialize)]
pub struct VoicePrefRequest {
    pub backend: String,
}

/// One voice in the catalog listing
#[derive(Debug, Serialize)]
pub struct VoiceInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Whether the voice carries a clone reference asset
    pub clone: bool,
}

/// Catalog listing response
#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
    pub count: usize,
}

/// One adapter in the status snapshot
#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub name: &'static str,
    pub available: Availability,
    pub consecutive_failures: u32,
    pub default: bool,
}

/// Adapter status snapshot
#[derive(Debug, Serialize)]
pub struct BackendsResponse {
    pub backends: Vec<BackendStatus>,
    pub default: &'static str,
}

/// OpenAI-compatible model entry
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: &'static str,
    pub owned_by: &'static str,
}

/// OpenAI-compatible model listing
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub object: &'static str,
    pub data: Vec<ModelInfo>,
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub message: String,
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
