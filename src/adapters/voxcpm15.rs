//! VoxCPM 1.5 adapter
//!
//! The 44.1 kHz successor to VoxCPM, fronted by an OpenAI-compatible
//! server. Catalog voices preloaded on the server go through the plain
//! speech endpoint; clone voices upload their reference as a multipart
//! form, streamed from disk rather than buffered. Ignores `speed`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

use crate::adapters::traits::{SynthesisJob, SynthesizedAudio, TtsBackend};
use crate::adapters::upstream_error;
use crate::audio::AudioFormat;
use crate::core::error::{Result, TtsError};
use crate::profiles::BackendKind;
use crate::voice::Voice;

/// VoxCPM 1.5 clone server
pub struct VoxCpm15Adapter {
    base_url: String,
    client: Client,
    /// Catalog voices the server reported, for support checks
    known_voices: RwLock<HashSet<String>>,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<String>,
}

impl VoxCpm15Adapter {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            base_url,
            client,
            known_voices: RwLock::new(HashSet::new()),
        })
    }

    /// Synthesize with a preloaded catalog voice
    async fn speak_catalog(&self, job: &SynthesisJob<'_>) -> Result<SynthesizedAudio> {
        let body = json!({
            "input": job.text,
            "voice": job.voice.name,
            "model": "voxcpm-1.5",
            "response_format": "wav",
        });

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm15, &e))?;

        self.collect_audio(response).await
    }

    /// Synthesize by uploading the reference recording per request
    async fn speak_clone(&self, job: &SynthesisJob<'_>, reference: &Path) -> Result<SynthesizedAudio> {
        let file = tokio::fs::File::open(reference)
            .await
            .map_err(|e| TtsError::BackendDefinitive {
                kind: BackendKind::VoxCpm15,
                message: format!("reference {} unreadable: {e}", reference.display()),
            })?;
        let stream = tokio_util::io::ReaderStream::new(file);
        let part = reqwest::multipart::Part::stream(reqwest::Body::wrap_stream(stream))
            .file_name("reference.wav")
            .mime_str("audio/wav")
            .map_err(|e| TtsError::BackendTransient {
                kind: BackendKind::VoxCpm15,
                message: e.to_string(),
            })?;

        let form = reqwest::multipart::Form::new()
            .text("text", job.text.to_string())
            .text("voice_name", job.voice.name.clone())
            .text(
                "reference_text",
                job.voice.transcript.clone().unwrap_or_default(),
            )
            .part("reference_audio", part);

        let response = self
            .client
            .post(format!("{}/v1/clone", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm15, &e))?;

        self.collect_audio(response).await
    }

    async fn collect_audio(&self, response: reqwest::Response) -> Result<SynthesizedAudio> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::VoxCpm15, status, &body));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm15, &e))?;
        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Wav,
            sample_rate: 44_100,
        })
    }
}

#[async_trait]
impl TtsBackend for VoxCpm15Adapter {
    fn kind(&self) -> BackendKind {
        BackendKind::VoxCpm15
    }

    fn requires_reference(&self) -> bool {
        false
    }

    fn max_concurrency(&self) -> usize {
        2
    }

    fn supports_voice(&self, voice: &Voice) -> bool {
        voice.is_clone()
            || self
                .known_voices
                .read()
                .expect("voice cache lock poisoned")
                .contains(&voice.name)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let response = self
            .client
            .get(format!("{}/v1/voices", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm15, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::VoxCpm15, status, &body));
        }

        let listed: VoicesResponse =
            response
                .json()
                .await
                .map_err(|e| TtsError::BackendTransient {
                    kind: BackendKind::VoxCpm15,
                    message: format!("voice list malformed: {e}"),
                })?;

        *self.known_voices.write().expect("voice cache lock poisoned") =
            listed.voices.iter().cloned().collect();

        Ok(listed
            .voices
            .into_iter()
            .map(|name| Voice::catalog(name, BackendKind::VoxCpm15, Some("Character".into())))
            .collect())
    }

    async fn probe(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<SynthesizedAudio> {
        match job.voice.reference_path.as_deref() {
            Some(reference) => self.speak_clone(job, reference).await,
            None => self.speak_catalog(job).await,
        }
    }
}
