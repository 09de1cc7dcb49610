//! VibeVoice adapter
//!
//! Lightweight streaming TTS server with a handful of named presets.
//! The wire protocol is plain REST; the neutral preset name maps onto
//! the upstream's language-prefixed identifier. Ignores `speed`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::adapters::traits::{SynthesisJob, SynthesizedAudio, TtsBackend};
use crate::adapters::upstream_error;
use crate::audio::AudioFormat;
use crate::core::error::{Result, TtsError};
use crate::profiles::BackendKind;
use crate::voice::Voice;

/// Preset names and their upstream identifiers
const VIBEVOICE_VOICES: &[(&str, &str)] = &[
    ("emma", "en-Emma_woman"),
    ("carter", "en-Carter_man"),
    ("davis", "en-Davis_man"),
    ("frank", "en-Frank_man"),
    ("grace", "en-Grace_woman"),
    ("mike", "en-Mike_man"),
    ("samuel", "in-Samuel_man"),
];

/// VibeVoice streaming TTS backend
pub struct VibeVoiceAdapter {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    model_loaded: bool,
}

impl VibeVoiceAdapter {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { base_url, client })
    }

    fn map_voice(name: &str) -> Option<&'static str> {
        let lowered = name.to_lowercase();
        VIBEVOICE_VOICES
            .iter()
            .find(|&&(preset, _)| preset == lowered)
            .map(|&(_, upstream)| upstream)
    }
}

#[async_trait]
impl TtsBackend for VibeVoiceAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::VibeVoice
    }

    fn requires_reference(&self) -> bool {
        false
    }

    fn max_concurrency(&self) -> usize {
        4
    }

    fn supports_voice(&self, voice: &Voice) -> bool {
        Self::map_voice(&voice.name).is_some()
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(VIBEVOICE_VOICES
            .iter()
            .map(|&(preset, _)| {
                Voice::catalog(preset, BackendKind::VibeVoice, Some("Preset".into()))
            })
            .collect())
    }

    async fn probe(&self) -> bool {
        let Ok(response) = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
        else {
            return false;
        };
        if !response.status().is_success() {
            return false;
        }
        response
            .json::<HealthResponse>()
            .await
            .map(|h| h.model_loaded)
            .unwrap_or(false)
    }

    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<SynthesizedAudio> {
        let voice = Self::map_voice(&job.voice.name).ok_or_else(|| TtsError::BackendDefinitive {
            kind: BackendKind::VibeVoice,
            message: format!("unknown preset '{}'", job.voice.name),
        })?;

        let body = json!({
            "input": job.text,
            "voice": voice,
            "model": "vibevoice-realtime-0.5b",
            "response_format": "wav",
        });

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VibeVoice, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::VibeVoice, status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VibeVoice, &e))?;

        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Wav,
            sample_rate: 24_000,
        })
    }
}
