//! OpenAudio (Fish Speech) adapter
//!
//! Zero-shot voice cloning over REST/JSON. The reference recording and
//! its transcript travel base64-encoded inside the request body on
//! every call; the backend holds no voice state between requests.
//! Ignores `speed` (the upstream has no such control).

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::adapters::traits::{SynthesisJob, SynthesizedAudio, TtsBackend};
use crate::adapters::upstream_error;
use crate::audio::AudioFormat;
use crate::core::error::{Result, TtsError};
use crate::profiles::BackendKind;
use crate::voice::Voice;

/// OpenAudio S1-Mini voice-clone backend
pub struct OpenAudioAdapter {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct TtsBody<'a> {
    text: &'a str,
    format: &'a str,
    references: Vec<Reference>,
}

#[derive(Debug, Serialize)]
struct Reference {
    audio: String,
    text: String,
}

impl OpenAudioAdapter {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl TtsBackend for OpenAudioAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenAudio
    }

    fn requires_reference(&self) -> bool {
        true
    }

    fn max_concurrency(&self) -> usize {
        2
    }

    fn supports_voice(&self, voice: &Voice) -> bool {
        voice.is_clone()
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        // Clone-only backend: every voice comes from the clone directory
        Ok(Vec::new())
    }

    async fn probe(&self) -> bool {
        self.client
            .get(format!("{}/v1/health", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<SynthesizedAudio> {
        let reference_path =
            job.voice
                .reference_path
                .as_ref()
                .ok_or_else(|| TtsError::BackendDefinitive {
                    kind: BackendKind::OpenAudio,
                    message: format!("voice '{}' has no reference audio", job.voice.name),
                })?;

        let reference_audio =
            tokio::fs::read(reference_path)
                .await
                .map_err(|e| TtsError::BackendDefinitive {
                    kind: BackendKind::OpenAudio,
                    message: format!("reference {} unreadable: {e}", reference_path.display()),
                })?;

        let body = TtsBody {
            text: job.text,
            format: "wav",
            references: vec![Reference {
                audio: base64::engine::general_purpose::STANDARD.encode(reference_audio),
                text: job.voice.transcript.clone().unwrap_or_default(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/tts", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::OpenAudio, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::OpenAudio, status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::OpenAudio, &e))?;

        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Wav,
            sample_rate: 44_100,
        })
    }
}
