//! ElevenLabs adapter
//!
//! Hosted cloud TTS addressed with an API key from the environment.
//! Voices are referenced by opaque ids; a small table maps friendly
//! names onto the well-known premade set, and anything that already
//! looks like a voice id is passed through. The upstream accepts a
//! `speed` setting, which this adapter forwards. Native output is MP3;
//! the stitcher decodes it when chunks must be joined.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::adapters::traits::{SynthesisJob, SynthesizedAudio, TtsBackend};
use crate::adapters::upstream_error;
use crate::audio::AudioFormat;
use crate::core::error::{Result, TtsError};
use crate::profiles::BackendKind;
use crate::voice::Voice;

/// Premade voices and their upstream ids
const ELEVENLABS_VOICES: &[(&str, &str)] = &[
    ("rachel", "21m00Tcm4TlvDq8ikWAM"),
    ("drew", "29vD33N1CtxCmqQRPOHJ"),
    ("paul", "5Q0t7uMcjvnagumLfvZi"),
    ("dave", "CYw3kZ02Hs0563khs1Fj"),
    ("sarah", "EXAVITQu4vr4xnSDxMaL"),
    ("adam", "pNInz6obpgDQGcFmaJgB"),
    ("sam", "yoZ06aMxZJJ28mfd3POQ"),
];

const DEFAULT_VOICE: &str = "adam";

/// ElevenLabs hosted cloud backend
pub struct ElevenLabsAdapter {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

impl ElevenLabsAdapter {
    pub fn new(base_url: String, api_key: String) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("xi-api-key", HeaderValue::from_str(&api_key)?);
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()?;
        Ok(Self { base_url, client })
    }

    /// Resolve a friendly name or pass an opaque voice id through
    fn resolve_voice_id(name: &str) -> &str {
        if name.len() > 15 && name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return name;
        }
        let lowered = name.to_lowercase();
        ELEVENLABS_VOICES
            .iter()
            .find(|&&(friendly, _)| friendly == lowered)
            .or_else(|| {
                ELEVENLABS_VOICES
                    .iter()
                    .find(|&&(friendly, _)| friendly == DEFAULT_VOICE)
            })
            .map(|&(_, id)| id)
            .unwrap_or(DEFAULT_VOICE)
    }

    fn looks_like_voice_id(name: &str) -> bool {
        name.len() > 15 && name.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

#[async_trait]
impl TtsBackend for ElevenLabsAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::ElevenLabs
    }

    fn requires_reference(&self) -> bool {
        false
    }

    fn max_concurrency(&self) -> usize {
        4
    }

    fn supports_voice(&self, voice: &Voice) -> bool {
        let lowered = voice.name.to_lowercase();
        ELEVENLABS_VOICES
            .iter()
            .any(|&(friendly, _)| friendly == lowered)
            || Self::looks_like_voice_id(&voice.name)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(ELEVENLABS_VOICES
            .iter()
            .map(|&(friendly, _)| {
                Voice::catalog(friendly, BackendKind::ElevenLabs, Some("Premade".into()))
            })
            .collect())
    }

    async fn probe(&self) -> bool {
        self.client
            .get(format!("{}/user", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<SynthesizedAudio> {
        let voice_id = Self::resolve_voice_id(&job.voice.name);
        let body = SpeechBody {
            text: job.text,
            model_id: "eleven_monolingual_v1",
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
                speed: job.speed,
            },
        };

        let response = self
            .client
            .post(format!("{}/text-to-speech/{voice_id}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::ElevenLabs, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::ElevenLabs, status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::ElevenLabs, &e))?;

        // The upstream emits MP3 regardless of the hint
        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Mp3,
            sample_rate: 44_100,
        })
    }
}
