//! Kokoro adapter
//!
//! Neural TTS catalog behind an OpenAI-shaped REST server. No cloning;
//! a large set of built-in voices addressed by prefixed identifiers
//! (`bf_emma` is British Female). Honors the `speed` parameter and can
//! emit any of the gateway's output containers directly, which makes
//! short requests a straight passthrough.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use crate::adapters::traits::{SynthesisJob, SynthesizedAudio, TtsBackend};
use crate::adapters::upstream_error;
use crate::core::error::{Result, TtsError};
use crate::profiles::BackendKind;
use crate::voice::Voice;

/// Built-in Kokoro voice identifiers
const KOKORO_VOICES: &[&str] = &[
    // American Female
    "af_alloy", "af_aoede", "af_bella", "af_heart", "af_jadzia", "af_jessica", "af_kore",
    "af_nicole", "af_nova", "af_river", "af_sarah", "af_sky",
    // American Male
    "am_adam", "am_echo", "am_eric", "am_fenrir", "am_liam", "am_michael", "am_onyx", "am_puck",
    "am_santa",
    // British Female
    "bf_alice", "bf_emma", "bf_lily",
    // British Male
    "bm_daniel", "bm_fable", "bm_george", "bm_lewis",
    // Other languages
    "ef_dora", "em_alex", "em_santa", "ff_siwis", "hf_alpha", "hf_beta", "hm_omega", "hm_psi",
    "if_sara", "im_nicola", "jf_alpha", "jf_gongitsune", "jf_nezumi", "jf_tebukuro", "jm_kumo",
    "pf_dora", "pm_alex",
];

/// OpenAI voice names mapped onto Kokoro equivalents
const OPENAI_ALIASES: &[(&str, &str)] = &[
    ("alloy", "af_alloy"),
    ("echo", "am_echo"),
    ("fable", "bm_fable"),
    ("onyx", "am_onyx"),
    ("nova", "af_nova"),
    ("shimmer", "af_sky"),
];

fn voice_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        KOKORO_VOICES
            .iter()
            .copied()
            .chain(OPENAI_ALIASES.iter().map(|&(alias, _)| alias))
            .collect()
    })
}

/// Kokoro neural TTS over REST/JSON
pub struct KokoroAdapter {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

impl KokoroAdapter {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { base_url, client })
    }

    /// Resolve OpenAI aliases onto native Kokoro identifiers
    fn map_voice(name: &str) -> String {
        let lowered = name.to_lowercase();
        OPENAI_ALIASES
            .iter()
            .find(|&&(alias, _)| alias == lowered)
            .map(|&(_, native)| native.to_string())
            .unwrap_or(lowered)
    }

    /// Derive the display category from the identifier prefix
    fn category(name: &str) -> Option<String> {
        let mut chars = name.chars();
        let region = match chars.next()? {
            'a' => "American",
            'b' => "British",
            'e' => "Spanish",
            'f' => "French",
            'h' => "Hindi",
            'i' => "Italian",
            'j' => "Japanese",
            'p' => "Portuguese",
            _ => return None,
        };
        let gender = match chars.next()? {
            'f' => "Female",
            'm' => "Male",
            _ => return None,
        };
        if chars.next()? != '_' {
            return None;
        }
        Some(format!("{region} {gender}"))
    }
}

#[async_trait]
impl TtsBackend for KokoroAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Kokoro
    }

    fn requires_reference(&self) -> bool {
        false
    }

    fn max_concurrency(&self) -> usize {
        4
    }

    fn supports_voice(&self, voice: &Voice) -> bool {
        voice_set().contains(voice.name.to_lowercase().as_str())
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(KOKORO_VOICES
            .iter()
            .map(|&name| Voice::catalog(name, BackendKind::Kokoro, Self::category(name)))
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
        let voice = Self::map_voice(&job.voice.name);
        let body = SpeechBody {
            model: "kokoro",
            voice: &voice,
            input: job.text,
            response_format: job.format_hint.as_str(),
            speed: job.speed,
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::Kokoro, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::Kokoro, status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::Kokoro, &e))?;

        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            format: job.format_hint,
            sample_rate: 24_000,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_aliases_resolve() {
        assert_eq!(KokoroAdapter::map_voice("shimmer"), "af_sky");
        assert_eq!(KokoroAdapter::map_voice("FABLE"), "bm_fable");
        assert_eq!(KokoroAdapter::map_voice("bf_emma"), "bf_emma");
    }

    #[test]
    fn test_category_from_prefix() {
        assert_eq!(KokoroAdapter::category("bf_emma").as_deref(), Some("British Female"));
        assert_eq!(KokoroAdapter::category("am_adam").as_deref(), Some("American Male"));
        assert_eq!(KokoroAdapter::category("jf_alpha").as_deref(), Some("Japanese Female"));
        assert_eq!(KokoroAdapter::category("xx_what"), None);
    }

    #[test]
    fn test_voice_support() {
        let adapter = KokoroAdapter::new("http://localhost:8880".into()).unwrap();
        let emma = Voice::catalog("bf_emma", BackendKind::Kokoro, None);
        let alias = Voice::catalog("nova", BackendKind::Kokoro, None);
        let unknown = Voice::catalog("morgan", BackendKind::Kokoro, None);
        assert!(adapter.supports_voice(&emma));
        assert!(adapter.supports_voice(&alias));
        assert!(!adapter.supports_voice(&unknown));
    }

    #[test]
    fn test_speed_omitted_when_absent() {
        let body = SpeechBody {
            model: "kokoro",
            voice: "bf_emma",
            input: "hi",
            response_format: "wav",
            speed: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("speed"));
    }
}
