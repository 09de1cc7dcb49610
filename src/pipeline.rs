//! The synthesis pipeline
//!
//! Orchestrates one request end to end: resolve the voice, walk the
//! router's failover chain, chunk per the attempted backend's profile,
//! synthesize chunks in bounded parallel, stitch in submission order,
//! and transcode into the caller's container.
//!
//! Failure policy: a transient chunk failure abandons the attempt and
//! moves to the next adapter in the chain; audio from different
//! backends is never mixed into one response. Definitive refusals skip
//! the adapter without touching its health. Dropping the returned
//! future (client disconnect) cancels every in-flight upstream call.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::adapters::{RegisteredAdapter, SynthesisJob, SynthesizedAudio};
use crate::audio::{stitcher, transcoder, AudioBuffer, AudioFormat};
use crate::core::error::{Result, TtsError};
use crate::profiles::{self, BackendKind};
use crate::router::Router;
use crate::text::{chunk_text, word_count};
use crate::voice::{Voice, VoicePreferences, VoiceRegistry};

/// Bounds accepted for the `speed` parameter
pub const SPEED_RANGE: (f32, f32) = (0.25, 4.0);

/// One synthesis request after HTTP decoding
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    pub format: AudioFormat,
    pub speed: Option<f32>,
    /// Explicit backend override; used alone, no fallback
    pub backend: Option<BackendKind>,
}

/// Finished audio ready for the response body
#[derive(Debug)]
pub struct SynthesisOutput {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    /// Backend that produced the audio
    pub backend: BackendKind,
}

/// The request pipeline shared by all handlers
pub struct Pipeline {
    router: Arc<Router>,
    registry: Arc<VoiceRegistry>,
    prefs: Arc<VoicePreferences>,
    /// Caps concurrent chunk synthesis across all requests
    global_chunks: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(
        router: Arc<Router>,
        registry: Arc<VoiceRegistry>,
        prefs: Arc<VoicePreferences>,
        chunk_parallelism: usize,
    ) -> Self {
        Self {
            router,
            registry,
            prefs,
            global_chunks: Arc::new(Semaphore::new(chunk_parallelism.max(1))),
        }
    }

    /// Run one request through the pipeline
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput> {
        validate(request)?;

        let voice = self.resolve_voice(&request.voice);
        let chain = self.router.chain(&voice, request.backend, &self.prefs)?;
        debug!(
            voice = %voice.name,
            chain = ?chain.iter().map(|a| a.kind()).collect::<Vec<_>>(),
            "routing request"
        );

        let mut last_error: Option<TtsError> = None;
        let mut saw_transient = false;
        for adapter in &chain {
            match self.try_adapter(adapter, &voice, request).await {
                Ok(output) => return Ok(output),
                Err(e) if e.is_transient() => {
                    warn!("backend {} failed, trying next: {e}", adapter.kind());
                    adapter.health.record_failure();
                    saw_transient = true;
                    last_error = Some(e);
                }
                Err(e) if e.is_definitive() => {
                    debug!("backend {} refused: {e}", adapter.kind());
                    last_error = Some(e);
                }
                // Request-shaped failures are not recoverable by failover
                Err(e) => return Err(e),
            }
        }

        match last_error {
            Some(e) if saw_transient => Err(e),
            _ => Err(TtsError::VoiceUnknown {
                voice: voice.name.clone(),
            }),
        }
    }

    /// Catalog entry for the name, or a bare voice for opaque ids that
    /// adapters may still claim
    fn resolve_voice(&self, name: &str) -> Voice {
        self.registry.get(name).unwrap_or_else(|| Voice {
            name: name.to_string(),
            category: None,
            backend: None,
            reference_path: None,
            transcript: None,
        })
    }

    /// One full attempt against a single adapter
    async fn try_adapter(
        &self,
        adapter: &Arc<RegisteredAdapter>,
        voice: &Voice,
        request: &SynthesisRequest,
    ) -> Result<SynthesisOutput> {
        let kind = adapter.kind();
        let profile = profiles::profile(kind);
        let chunks = chunk_text(&request.text, profile)?;
        if chunks.is_empty() {
            return Err(TtsError::InvalidRequest {
                message: "input text is empty".to_string(),
            });
        }

        info!(
            backend = %kind,
            words = word_count(&request.text),
            chunks = chunks.len(),
            "synthesizing"
        );

        if chunks.len() == 1 {
            let audio = self
                .synthesize_chunk(adapter, voice, &chunks[0].text, request.format, request.speed)
                .await?;
            adapter.health.record_success();

            if audio.format == request.format {
                // Native container match: bytes pass through untouched
                return Ok(SynthesisOutput {
                    bytes: audio.bytes,
                    format: audio.format,
                    backend: kind,
                });
            }
            let buffer = decode_audio(audio).await?;
            return finalize(buffer, request.format, kind).await;
        }

        // Chunked path: synthesize as WAV in parallel, reassemble by
        // submission index, fail the attempt on any chunk failure
        let results: Vec<SynthesizedAudio> = futures::future::try_join_all(
            chunks.iter().map(|chunk| {
                self.synthesize_chunk(adapter, voice, &chunk.text, AudioFormat::Wav, request.speed)
            }),
        )
        .await?;
        adapter.health.record_success();

        let mut buffers = Vec::with_capacity(results.len());
        for audio in results {
            buffers.push(decode_audio(audio).await?);
        }

        let stitched = stitcher::stitch(buffers, profile.crossfade_ms)?;
        debug!(
            backend = %kind,
            duration_ms = stitched.duration_ms() as u64,
            "stitched"
        );
        finalize(stitched, request.format, kind).await
    }

    /// Synthesize one chunk under both concurrency bounds and the
    /// per-adapter timeout
    async fn synthesize_chunk(
        &self,
        adapter: &Arc<RegisteredAdapter>,
        voice: &Voice,
        text: &str,
        format_hint: AudioFormat,
        speed: Option<f32>,
    ) -> Result<SynthesizedAudio> {
        let _global = self
            .global_chunks
            .acquire()
            .await
            .map_err(|_| TtsError::Cancelled)?;
        let _local = adapter
            .semaphore
            .acquire()
            .await
            .map_err(|_| TtsError::Cancelled)?;

        let job = SynthesisJob {
            text,
            voice,
            format_hint,
            speed,
        };
        match tokio::time::timeout(adapter.call_timeout, adapter.backend.synthesize(&job)).await {
            Ok(result) => result,
            Err(_) => Err(TtsError::BackendTransient {
                kind: adapter.kind(),
                message: format!("call timed out after {:?}", adapter.call_timeout),
            }),
        }
    }
}

fn validate(request: &SynthesisRequest) -> Result<()> {
    if request.text.trim().is_empty() {
        return Err(TtsError::InvalidRequest {
            message: "input text is empty".to_string(),
        });
    }
    if let Some(speed) = request.speed {
        if !(SPEED_RANGE.0..=SPEED_RANGE.1).contains(&speed) {
            return Err(TtsError::InvalidRequest {
                message: format!(
                    "speed {speed} outside [{}, {}]",
                    SPEED_RANGE.0, SPEED_RANGE.1
                ),
            });
        }
    }
    Ok(())
}

/// Bring one adapter result into PCM, whatever container it arrived in
async fn decode_audio(audio: SynthesizedAudio) -> Result<AudioBuffer> {
    match audio.format {
        AudioFormat::Wav => AudioBuffer::from_wav_bytes(&audio.bytes),
        _ => transcoder::decode_to_pcm(audio.bytes, audio.sample_rate).await,
    }
}

/// Encode a finished buffer into the requested container
async fn finalize(
    buffer: AudioBuffer,
    format: AudioFormat,
    backend: BackendKind,
) -> Result<SynthesisOutput> {
    let wav = buffer.to_wav_bytes()?;
    let bytes = transcoder::encode(wav, format).await?;
    Ok(SynthesisOutput {
        bytes,
        format,
        backend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_rejects_empty_text() {
        let request = SynthesisRequest {
            text: "  \n ".into(),
            voice: "bf_emma".into(),
            format: AudioFormat::Mp3,
            speed: None,
            backend: None,
        };
        assert!(matches!(
            validate(&request),
            Err(TtsError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_out_of_range_speed() {
        let mut request = SynthesisRequest {
            text: "hello".into(),
            voice: "bf_emma".into(),
            format: AudioFormat::Mp3,
            speed: Some(5.0),
            backend: None,
        };
        assert!(validate(&request).is_err());
        request.speed = Some(1.0);
        assert!(validate(&request).is_ok());
        request.speed = Some(0.25);
        assert!(validate(&request).is_ok());
    }
}
