//! Shared test fixtures: a scriptable mock backend and state builders.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use unified_tts::adapters::{RegisteredAdapter, SynthesisJob, SynthesizedAudio, TtsBackend};
use unified_tts::audio::{AudioBuffer, AudioFormat};
use unified_tts::core::error::{Result, TtsError};
use unified_tts::profiles::BackendKind;
use unified_tts::voice::{Voice, VoicePreferences, VoiceRegistry};

/// What a mock call should do
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Return a valid one-second WAV tone (or raw bytes for non-WAV hints)
    Succeed,
    /// Fail with a transient (retriable) error
    Transient,
    /// Fail with a definitive refusal
    Definitive,
    /// Never answer; exercises the per-call timeout
    Hang,
}

/// A scriptable in-process backend
pub struct MockBackend {
    pub kind: BackendKind,
    pub voices: Vec<String>,
    pub accepts_clones: bool,
    pub behavior: MockBehavior,
    pub sample_rate: u32,
    pub calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new(kind: BackendKind, voices: &[&str], behavior: MockBehavior) -> Self {
        Self {
            kind,
            voices: voices.iter().map(|s| s.to_string()).collect(),
            accepts_clones: false,
            behavior,
            sample_rate: 24_000,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn clone_backend(kind: BackendKind, behavior: MockBehavior) -> Self {
        Self {
            accepts_clones: true,
            ..Self::new(kind, &[], behavior)
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    fn tone_wav(&self) -> Vec<u8> {
        let samples: Vec<f32> = (0..self.sample_rate)
            .map(|i| {
                (2.0 * std::f32::consts::PI * 220.0 * i as f32 / self.sample_rate as f32).sin()
                    * 0.5
            })
            .collect();
        AudioBuffer::new(samples, self.sample_rate)
            .to_wav_bytes()
            .expect("tone encode")
    }
}

#[async_trait]
impl TtsBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn requires_reference(&self) -> bool {
        self.accepts_clones
    }

    fn max_concurrency(&self) -> usize {
        4
    }

    fn supports_voice(&self, voice: &Voice) -> bool {
        (self.accepts_clones && voice.is_clone()) || self.voices.iter().any(|v| v == &voice.name)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(self
            .voices
            .iter()
            .map(|name| Voice::catalog(name.clone(), self.kind, None))
            .collect())
    }

    async fn probe(&self) -> bool {
        matches!(self.behavior, MockBehavior::Succeed)
    }

    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Succeed => {
                let bytes = if job.format_hint == AudioFormat::Wav {
                    self.tone_wav()
                } else {
                    // Pretend native support for the hinted container
                    format!("{}-encoded-by-{}", job.format_hint, self.kind).into_bytes()
                };
                Ok(SynthesizedAudio {
                    bytes,
                    format: job.format_hint,
                    sample_rate: self.sample_rate,
                })
            }
            MockBehavior::Transient => Err(TtsError::BackendTransient {
                kind: self.kind,
                message: "connection refused".to_string(),
            }),
            MockBehavior::Definitive => Err(TtsError::BackendDefinitive {
                kind: self.kind,
                message: "voice rejected".to_string(),
            }),
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hanging call should have been timed out")
            }
        }
    }
}

/// Register a mock with a short call timeout
pub fn registered(backend: MockBackend) -> Arc<RegisteredAdapter> {
    RegisteredAdapter::new(Box::new(backend), Duration::from_millis(500))
}

/// A unique temp path that does not yet exist
pub fn temp_path(suffix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("unified-tts-it-{}{suffix}", uuid::Uuid::new_v4()))
}

/// Empty registry and prefs backed by temp paths
pub fn empty_state() -> (Arc<VoiceRegistry>, Arc<VoicePreferences>) {
    let registry = Arc::new(VoiceRegistry::new(temp_path("-voices")));
    registry.rebuild(Vec::new());
    let prefs = Arc::new(VoicePreferences::load(temp_path("-prefs.json")));
    (registry, prefs)
}

/// A clone voice pointing at a real temp reference file
pub fn clone_voice(name: &str) -> Voice {
    let dir = temp_path("-ref");
    std::fs::create_dir_all(&dir).expect("create ref dir");
    let reference = dir.join("reference.wav");
    std::fs::write(&reference, b"RIFF").expect("write reference");
    Voice {
        name: name.to_string(),
        category: None,
        backend: None,
        reference_path: Some(reference),
        transcript: Some("reference transcript".to_string()),
    }
}
