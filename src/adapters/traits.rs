//! The uniform synthesis contract
//!
//! Every upstream engine, whatever its wire protocol, is driven
//! through this one trait. Adapters translate the neutral voice
//! identifier into the backend's expected form, attach reference
//! assets for clone backends, and map upstream failures into the
//! typed error set.

use async_trait::async_trait;

use crate::audio::AudioFormat;
use crate::core::error::Result;
use crate::profiles::BackendKind;
use crate::voice::Voice;

/// Parameters for synthesizing one chunk
#[derive(Debug, Clone)]
pub struct SynthesisJob<'a> {
    /// Chunk text, whitespace-normalized
    pub text: &'a str,
    /// Resolved catalog entry
    pub voice: &'a Voice,
    /// Advisory output format: `wav` when the result will be stitched,
    /// the caller's requested format for a single-chunk request
    pub format_hint: AudioFormat,
    /// Playback speed multiplier, forwarded only by adapters whose
    /// upstream accepts one
    pub speed: Option<f32>,
}

/// Audio produced by one adapter call
///
/// `format` is what the adapter actually emitted; the stitcher and
/// transcoder absorb any mismatch with the hint.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    /// Native sample rate of the backend's output
    pub sample_rate: u32,
}

/// One upstream TTS engine
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// The backend family, which also selects the capability profile
    fn kind(&self) -> BackendKind;

    /// Whether synthesis conditions on a reference audio asset
    fn requires_reference(&self) -> bool;

    /// Upstream tolerance for concurrent in-flight requests; enforced
    /// by the per-adapter semaphore
    fn max_concurrency(&self) -> usize;

    /// Whether this adapter claims it can synthesize the voice
    fn supports_voice(&self, voice: &Voice) -> bool;

    /// Voices the backend reports; merged into the catalog at startup.
    /// Clone-only backends report nothing.
    async fn list_voices(&self) -> Result<Vec<Voice>>;

    /// Check whether the upstream is reachable and ready
    async fn probe(&self) -> bool;

    /// Synthesize one chunk of text
    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<SynthesizedAudio>;
}
