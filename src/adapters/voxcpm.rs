//! VoxCPM adapter
//!
//! Character voice cloning behind a Gradio server. Gradio exposes a
//! session-style API rather than a single POST: the reference asset is
//! uploaded first, the generate call returns an event handle, and the
//! result is read from that handle as a server-sent event stream which
//! names the produced file. Ignores `speed`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use crate::adapters::traits::{SynthesisJob, SynthesizedAudio, TtsBackend};
use crate::adapters::upstream_error;
use crate::audio::AudioFormat;
use crate::core::error::{Result, TtsError};
use crate::profiles::BackendKind;
use crate::voice::Voice;

/// Inference guidance scale passed to the generate endpoint
const CFG_VALUE: f64 = 2.0;

/// Diffusion timesteps passed to the generate endpoint
const INFERENCE_TIMESTEPS: u32 = 10;

/// VoxCPM character cloning over the Gradio session API
pub struct VoxCpmAdapter {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct EventHandle {
    event_id: String,
}

#[derive(Debug, Deserialize)]
struct FileData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

impl VoxCpmAdapter {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { base_url, client })
    }

    fn transient(message: impl Into<String>) -> TtsError {
        TtsError::BackendTransient {
            kind: BackendKind::VoxCpm,
            message: message.into(),
        }
    }

    /// Upload the reference recording; Gradio answers with the server
    /// path the generate call must reference
    async fn upload_reference(&self, path: &Path) -> Result<String> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| TtsError::BackendDefinitive {
                kind: BackendKind::VoxCpm,
                message: format!("reference {} unreadable: {e}", path.display()),
            })?;
        let stream = tokio_util::io::ReaderStream::new(file);
        let part = reqwest::multipart::Part::stream(reqwest::Body::wrap_stream(stream))
            .file_name("reference.wav")
            .mime_str("audio/wav")
            .map_err(|e| Self::transient(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("files", part);

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::VoxCpm, status, &body));
        }

        let paths: Vec<String> = response
            .json()
            .await
            .map_err(|e| Self::transient(format!("upload response malformed: {e}")))?;
        paths
            .into_iter()
            .next()
            .ok_or_else(|| Self::transient("upload returned no file path"))
    }

    /// Submit the generate call and return its event handle
    async fn submit(&self, job: &SynthesisJob<'_>, reference: String) -> Result<String> {
        let payload = json!({
            "data": [
                job.text,
                { "path": reference, "meta": { "_type": "gradio.FileData" } },
                job.voice.transcript.clone().unwrap_or_default(),
                CFG_VALUE,
                INFERENCE_TIMESTEPS,
                false,
                false,
            ]
        });

        let response = self
            .client
            .post(format!("{}/call/generate", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::VoxCpm, status, &body));
        }

        let handle: EventHandle = response
            .json()
            .await
            .map_err(|e| Self::transient(format!("event handle malformed: {e}")))?;
        Ok(handle.event_id)
    }

    /// Read the event stream until the result frame names the file
    async fn fetch_result(&self, event_id: &str) -> Result<FileData> {
        let response = self
            .client
            .get(format!("{}/call/generate/{event_id}", self.base_url))
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::VoxCpm, status, &body));
        }

        let stream = response
            .text()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm, &e))?;
        parse_event_stream(&stream).ok_or_else(|| Self::transient("event stream carried no result"))
    }
}

/// Pull the first file descriptor out of the final `data:` frame
fn parse_event_stream(stream: &str) -> Option<FileData> {
    for line in stream.lines().rev() {
        let Some(payload) = line.strip_prefix("data:") else {
            continue;
        };
        let values: Vec<serde_json::Value> = serde_json::from_str(payload.trim()).ok()?;
        let first = values.into_iter().next()?;
        return serde_json::from_value(first).ok();
    }
    None
}

#[async_trait]
impl TtsBackend for VoxCpmAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::VoxCpm
    }

    fn requires_reference(&self) -> bool {
        true
    }

    fn max_concurrency(&self) -> usize {
        1
    }

    fn supports_voice(&self, voice: &Voice) -> bool {
        voice.is_clone()
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(Vec::new())
    }

    async fn probe(&self) -> bool {
        self.client
            .get(&self.base_url)
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
                    kind: BackendKind::VoxCpm,
                    message: format!("voice '{}' has no reference audio", job.voice.name),
                })?;

        let reference = self.upload_reference(reference_path).await?;
        let event_id = self.submit(job, reference).await?;
        let file = self.fetch_result(&event_id).await?;

        let file_url = match (file.url, file.path) {
            (Some(url), _) => url,
            (None, Some(path)) => format!("{}/file={path}", self.base_url),
            (None, None) => return Err(Self::transient("result frame carried no file")),
        };

        let response = self
            .client
            .get(&file_url)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(upstream_error(BackendKind::VoxCpm, status, ""));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::VoxCpm, &e))?;

        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Wav,
            sample_rate: 16_000,
        })
    }
}
