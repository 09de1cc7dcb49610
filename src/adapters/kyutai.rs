//! Kyutai (Moshi) adapter
//!
//! Emotional TTS with preset styles rather than cloned identities. The
//! server takes a JSON config-and-text submission and answers either
//! with inline audio or with a result handle that is fetched in a
//! second round trip. Ignores `speed`.

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

/// Emotion presets and their catalog descriptions
const KYUTAI_VOICES: &[(&str, &str)] = &[
    ("happy", "Cheerful and upbeat"),
    ("sad", "Thoughtful and empathetic"),
    ("angry", "Assertive and intense"),
    ("calm", "Peaceful and soothing"),
    ("confused", "Curious and questioning"),
    ("fearful", "Cautious and alert"),
    ("sleepy", "Relaxed and drowsy"),
    ("neutral", "Balanced and professional"),
];

/// Kyutai emotional TTS backend
pub struct KyutaiAdapter {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(default)]
    audio_url: Option<String>,
}

impl KyutaiAdapter {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { base_url, client })
    }

    fn is_emotion(name: &str) -> bool {
        let lowered = name.to_lowercase();
        KYUTAI_VOICES.iter().any(|&(emotion, _)| emotion == lowered)
    }
}

#[async_trait]
impl TtsBackend for KyutaiAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Kyutai
    }

    fn requires_reference(&self) -> bool {
        false
    }

    fn max_concurrency(&self) -> usize {
        2
    }

    fn supports_voice(&self, voice: &Voice) -> bool {
        Self::is_emotion(&voice.name)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(KYUTAI_VOICES
            .iter()
            .map(|&(emotion, description)| {
                Voice::catalog(emotion, BackendKind::Kyutai, Some(description.to_string()))
            })
            .collect())
    }

    async fn probe(&self) -> bool {
        self.client
            .get(format!("{}/", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<SynthesizedAudio> {
        let emotion = job.voice.name.to_lowercase();
        let body = json!({
            "text": job.text,
            "voice": emotion,
            "return_audio": true,
        });

        let response = self
            .client
            .post(format!("{}/synthesize", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::Kyutai, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::Kyutai, status, &body));
        }

        // Inline audio when the server streams it directly
        let inline_audio = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("audio/"));

        let bytes = if inline_audio {
            response
                .bytes()
                .await
                .map_err(|e| TtsError::from_upstream(BackendKind::Kyutai, &e))?
                .to_vec()
        } else {
            let parsed: SynthesizeResponse =
                response
                    .json()
                    .await
                    .map_err(|e| TtsError::BackendTransient {
                        kind: BackendKind::Kyutai,
                        message: format!("synthesis response malformed: {e}"),
                    })?;
            let audio_url = parsed.audio_url.ok_or_else(|| TtsError::BackendTransient {
                kind: BackendKind::Kyutai,
                message: "server returned neither audio nor a result handle".to_string(),
            })?;

            let audio = self
                .client
                .get(format!("{}{audio_url}", self.base_url))
                .send()
                .await
                .map_err(|e| TtsError::from_upstream(BackendKind::Kyutai, &e))?;
            let status = audio.status();
            if !status.is_success() {
                return Err(upstream_error(BackendKind::Kyutai, status, ""));
            }
            audio
                .bytes()
                .await
                .map_err(|e| TtsError::from_upstream(BackendKind::Kyutai, &e))?
                .to_vec()
        };

        Ok(SynthesizedAudio {
            bytes,
            format: AudioFormat::Wav,
            sample_rate: 24_000,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_names_supported() {
        let adapter = KyutaiAdapter::new("http://localhost:8899".into()).unwrap();
        let happy = Voice::catalog("happy", BackendKind::Kyutai, None);
        let shouty = Voice::catalog("HAPPY", BackendKind::Kyutai, None);
        let unknown = Voice::catalog("bf_emma", BackendKind::Kyutai, None);
        assert!(adapter.supports_voice(&happy));
        assert!(adapter.supports_voice(&shouty));
        assert!(!adapter.supports_voice(&unknown));
    }

    #[tokio::test]
    async fn test_catalog_lists_every_preset() {
        let adapter = KyutaiAdapter::new("http://localhost:8899".into()).unwrap();
        let voices = adapter.list_voices().await.unwrap();
        assert_eq!(voices.len(), KYUTAI_VOICES.len());
        assert!(voices.iter().all(|v| v.backend == Some(BackendKind::Kyutai)));
    }
}
