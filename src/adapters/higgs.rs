//! Higgs Audio adapter
//!
//! Generative voices created from scene descriptions and saved as
//! named characters on the server. The adapter addresses characters by
//! name and learns the available set from the character listing at
//! startup. Ignores `speed`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::RwLock;
use std::time::Duration;

use crate::adapters::traits::{SynthesisJob, SynthesizedAudio, TtsBackend};
use crate::adapters::upstream_error;
use crate::audio::AudioFormat;
use crate::core::error::{Result, TtsError};
use crate::profiles::BackendKind;
use crate::voice::Voice;

/// Higgs generative character backend
pub struct HiggsAdapter {
    base_url: String,
    client: Client,
    known_characters: RwLock<HashSet<String>>,
}

#[derive(Debug, Deserialize)]
struct CharactersResponse {
    #[serde(default)]
    characters: Vec<Character>,
}

#[derive(Debug, Deserialize)]
struct Character {
    name: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    model_loaded: bool,
}

impl HiggsAdapter {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            base_url,
            client,
            known_characters: RwLock::new(HashSet::new()),
        })
    }
}

#[async_trait]
impl TtsBackend for HiggsAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Higgs
    }

    fn requires_reference(&self) -> bool {
        false
    }

    fn max_concurrency(&self) -> usize {
        2
    }

    fn supports_voice(&self, voice: &Voice) -> bool {
        self.known_characters
            .read()
            .expect("character cache lock poisoned")
            .contains(&voice.name)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let response = self
            .client
            .get(format!("{}/v1/characters", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::Higgs, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::Higgs, status, &body));
        }

        let listed: CharactersResponse =
            response
                .json()
                .await
                .map_err(|e| TtsError::BackendTransient {
                    kind: BackendKind::Higgs,
                    message: format!("character list malformed: {e}"),
                })?;

        *self
            .known_characters
            .write()
            .expect("character cache lock poisoned") =
            listed.characters.iter().map(|c| c.name.clone()).collect();

        Ok(listed
            .characters
            .into_iter()
            .map(|c| Voice::catalog(c.name, BackendKind::Higgs, Some("Generated".into())))
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
        let body = json!({
            "input": job.text,
            "voice": job.voice.name,
        });

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::Higgs, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(BackendKind::Higgs, status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::from_upstream(BackendKind::Higgs, &e))?;

        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Wav,
            sample_rate: 24_000,
        })
    }
}
