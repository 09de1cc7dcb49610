//! End-to-end pipeline behavior against scriptable in-process backends:
//! short-circuit passthrough, chunked stitching, failover, and the
//! error dispositions.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{clone_voice, empty_state, registered, MockBackend, MockBehavior};

use unified_tts::audio::{AudioBuffer, AudioFormat};
use unified_tts::pipeline::{Pipeline, SynthesisRequest};
use unified_tts::profiles::{self, BackendKind};
use unified_tts::router::Router;
use unified_tts::text::chunk_text;
use unified_tts::voice::Voice;
use unified_tts::TtsError;

fn pipeline_with(adapters: Vec<Arc<unified_tts::RegisteredAdapter>>) -> Pipeline {
    let default = adapters[0].kind();
    let router = Arc::new(Router::new(adapters, default));
    let (registry, prefs) = empty_state();
    Pipeline::new(router, registry, prefs, 8)
}

fn pipeline_with_catalog(
    adapters: Vec<Arc<unified_tts::RegisteredAdapter>>,
    voices: Vec<Voice>,
) -> Pipeline {
    let default = adapters[0].kind();
    let router = Arc::new(Router::new(adapters, default));
    let (registry, prefs) = empty_state();
    registry.rebuild(voices);
    Pipeline::new(router, registry, prefs, 8)
}

fn speech(voice: &str, text: &str, format: AudioFormat) -> SynthesisRequest {
    SynthesisRequest {
        text: text.to_string(),
        voice: voice.to_string(),
        format,
        speed: None,
        backend: None,
    }
}

/// One short sentence: a single chunk whose native-format output must
/// pass through byte-identical, with no stitcher or transcoder run.
#[tokio::test]
async fn short_request_passes_adapter_bytes_through() {
    let mock = MockBackend::new(BackendKind::Kokoro, &["bf_emma"], MockBehavior::Succeed);
    let calls = mock.call_counter();
    let pipeline = pipeline_with_catalog(
        vec![registered(mock)],
        vec![Voice::catalog("bf_emma", BackendKind::Kokoro, None)],
    );

    let output = pipeline
        .synthesize(&speech("bf_emma", "Hello, world.", AudioFormat::Mp3))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(output.format, AudioFormat::Mp3);
    assert_eq!(output.backend, BackendKind::Kokoro);
    // Byte-equal to what the adapter produced, proving no re-encode
    assert_eq!(output.bytes, b"mp3-encoded-by-kokoro");
}

/// A long article is chunked, each chunk synthesized, and the joined
/// audio duration matches the crossfade arithmetic.
#[tokio::test]
async fn long_request_is_chunked_and_stitched() {
    let sentence = "The quick brown fox jumps over the lazy dog while everyone watches quietly. ";
    let article: String = std::iter::repeat(sentence).take(30).collect();

    let profile = profiles::profile(BackendKind::Kyutai);
    let expected_chunks = chunk_text(&article, profile).unwrap().len();
    assert!(expected_chunks > 1, "test input must require chunking");

    let mock = MockBackend::new(BackendKind::Kyutai, &["happy"], MockBehavior::Succeed);
    let calls = mock.call_counter();
    let sample_rate = mock.sample_rate;
    let pipeline = pipeline_with_catalog(
        vec![registered(mock)],
        vec![Voice::catalog("happy", BackendKind::Kyutai, None)],
    );

    let output = pipeline
        .synthesize(&speech("happy", &article, AudioFormat::Wav))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), expected_chunks);

    // Each mock chunk is exactly one second; joins each remove one
    // crossfade window
    let decoded = AudioBuffer::from_wav_bytes(&output.bytes).unwrap();
    let window = profile.crossfade_ms as usize * sample_rate as usize / 1000;
    let expected_samples =
        expected_chunks * sample_rate as usize - (expected_chunks - 1) * window;
    assert_eq!(decoded.samples.len(), expected_samples);
}

/// Scenario: the preferred backend fails transiently, the next in the
/// chain serves the request.
#[tokio::test]
async fn transient_failure_fails_over() {
    let broken = MockBackend::clone_backend(BackendKind::VoxCpm, MockBehavior::Transient);
    let broken_calls = broken.call_counter();
    let healthy = MockBackend::clone_backend(BackendKind::OpenAudio, MockBehavior::Succeed);

    let broken = registered(broken);
    let healthy_reg = registered(healthy);
    let router = Arc::new(Router::new(
        vec![broken.clone(), healthy_reg],
        BackendKind::VoxCpm,
    ));
    let (registry, prefs) = empty_state();
    prefs.set("morgan", BackendKind::VoxCpm);
    let pipeline = Pipeline::new(router, registry.clone(), prefs, 8);

    // Seed the catalog with the clone voice
    let voice = clone_voice("morgan");
    registry.rebuild(vec![voice]);

    let output = pipeline
        .synthesize(&speech("morgan", "Hello there.", AudioFormat::Wav))
        .await
        .unwrap();

    assert_eq!(output.backend, BackendKind::OpenAudio);
    assert_eq!(broken_calls.load(Ordering::SeqCst), 1);
    assert_eq!(broken.health.consecutive_failures(), 1);
}

/// Every adapter refuses definitively: the caller sees voice-unknown.
#[tokio::test]
async fn all_definitive_refusals_become_voice_unknown() {
    let a = MockBackend::new(BackendKind::Kokoro, &["emma"], MockBehavior::Definitive);
    let b = MockBackend::new(BackendKind::VibeVoice, &["emma"], MockBehavior::Definitive);
    let pipeline = pipeline_with_catalog(
        vec![registered(a), registered(b)],
        vec![Voice::catalog("emma", BackendKind::Kokoro, None)],
    );

    let err = pipeline
        .synthesize(&speech("emma", "Hi.", AudioFormat::Mp3))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::VoiceUnknown { .. }));
    assert_eq!(err.status(), 404);
}

/// Chain exhausted on transient failures: 502 surfaces.
#[tokio::test]
async fn exhausted_transient_chain_is_bad_gateway() {
    let a = MockBackend::new(BackendKind::Kokoro, &["emma"], MockBehavior::Transient);
    let b = MockBackend::new(BackendKind::VibeVoice, &["emma"], MockBehavior::Transient);
    let pipeline = pipeline_with_catalog(
        vec![registered(a), registered(b)],
        vec![Voice::catalog("emma", BackendKind::Kokoro, None)],
    );

    let err = pipeline
        .synthesize(&speech("emma", "Hi.", AudioFormat::Mp3))
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.status(), 502);
}

/// No adapter claims the voice at all.
#[tokio::test]
async fn unknown_voice_is_rejected() {
    let mock = MockBackend::new(BackendKind::Kokoro, &["bf_emma"], MockBehavior::Succeed);
    let pipeline = pipeline_with(vec![registered(mock)]);

    let err = pipeline
        .synthesize(&speech("nonexistent", "Hi.", AudioFormat::Mp3))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::VoiceUnknown { .. }));
}

/// A single enormous sentence with no split points refuses with 413
/// rather than truncating.
#[tokio::test]
async fn unsplittable_text_is_refused() {
    let words: Vec<String> = (0..500).map(|i| format!("word{i}")).collect();
    let wall = words.join(" ");

    let mock = MockBackend::new(BackendKind::Kokoro, &["bf_emma"], MockBehavior::Succeed);
    let calls = mock.call_counter();
    let pipeline = pipeline_with_catalog(
        vec![registered(mock)],
        vec![Voice::catalog("bf_emma", BackendKind::Kokoro, None)],
    );

    let err = pipeline
        .synthesize(&speech("bf_emma", &wall, AudioFormat::Mp3))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::ChunkTooLarge { .. }));
    assert_eq!(err.status(), 413);
    // Nothing was sent upstream
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// A hanging upstream is cut off by the per-call timeout and treated
/// as transient.
#[tokio::test]
async fn hanging_backend_times_out_as_transient() {
    let hang = MockBackend::new(BackendKind::Kokoro, &["emma"], MockBehavior::Hang);
    let rescue = MockBackend::new(BackendKind::VibeVoice, &["emma"], MockBehavior::Succeed);
    let pipeline = pipeline_with_catalog(
        vec![registered(hang), registered(rescue)],
        vec![Voice::catalog("emma", BackendKind::Kokoro, None)],
    );

    let output = pipeline
        .synthesize(&speech("emma", "Hello.", AudioFormat::Mp3))
        .await
        .unwrap();
    assert_eq!(output.backend, BackendKind::VibeVoice);
}

/// Empty input never reaches a backend.
#[tokio::test]
async fn empty_input_is_invalid() {
    let mock = MockBackend::new(BackendKind::Kokoro, &["bf_emma"], MockBehavior::Succeed);
    let pipeline = pipeline_with(vec![registered(mock)]);

    let err = pipeline
        .synthesize(&speech("bf_emma", "   ", AudioFormat::Mp3))
        .await
        .unwrap_err();
    assert!(matches!(err, TtsError::InvalidRequest { .. }));
    assert_eq!(err.status(), 400);
}
