//! # Unified TTS
//!
//! An OpenAI-compatible text-to-speech gateway over a heterogeneous
//! pool of upstream engines. Each backend has its own protocol, voice
//! catalog and generation length ceiling; the gateway removes the
//! ceiling by splitting text at natural boundaries, synthesizing the
//! pieces in parallel and stitching the audio back into one seamless
//! stream in the caller's requested container.
//!
//! ## Request flow
//!
//! ```text
//! HTTP -> Router -> Chunker -> {Adapter xN in parallel}
//!                                      |
//!                                  Stitcher -> Transcoder -> response
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use unified_tts::{config::Config, server};
//!
//! let config = Config::from_env();
//! server::run(config).await?;
//! ```

pub mod adapters;
pub mod audio;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod profiles;
pub mod router;
pub mod server;
pub mod text;
pub mod voice;

// Re-exports for library consumers
pub use adapters::{RegisteredAdapter, SynthesisJob, SynthesizedAudio, TtsBackend};
pub use audio::{AudioBuffer, AudioFormat};
pub use config::Config;
pub use crate::core::error::{Result, TtsError};
pub use pipeline::{Pipeline, SynthesisOutput, SynthesisRequest};
pub use profiles::{profile, BackendKind, BackendProfile};
pub use router::Router;
pub use text::{chunk_text, Chunk};
pub use voice::{Voice, VoicePreferences, VoiceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
