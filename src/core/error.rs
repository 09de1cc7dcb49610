//! Structured error handling for the TTS gateway
//!
//! Every failure the pipeline can produce maps to one of the typed
//! kinds below. The router recovers from transient backend failures
//! by moving down its failover chain; every other kind aborts the
//! request and surfaces to the client with the status in `status()`.

use thiserror::Error;

use crate::profiles::BackendKind;

/// Result type alias with TtsError
pub type Result<T> = std::result::Result<T, TtsError>;

/// Main error type for the gateway
#[derive(Error, Debug, Clone)]
pub enum TtsError {
    /// Malformed or unusable client input
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// No adapter claims the requested voice
    #[error("no backend recognizes voice '{voice}'")]
    VoiceUnknown { voice: String },

    /// A text unit could not be split under the backend ceiling
    #[error("a {words}-word segment exceeds the {max_words}-word ceiling for {kind}")]
    ChunkTooLarge {
        kind: BackendKind,
        words: usize,
        max_words: usize,
    },

    /// Network error, upstream 5xx, or timeout; eligible for failover
    #[error("backend {kind} unavailable: {message}")]
    BackendTransient { kind: BackendKind, message: String },

    /// The backend understood the request and refused it
    #[error("backend {kind} rejected the request: {message}")]
    BackendDefinitive { kind: BackendKind, message: String },

    /// Buffer decode or sample-rate resolution failed while joining chunks
    #[error("audio stitching failed: {message}")]
    StitchFailure { message: String },

    /// The external encoder process failed
    #[error("audio encoding failed: {message}")]
    EncodeFailure { message: String },

    /// Client disconnect or deadline expiry
    #[error("request cancelled")]
    Cancelled,
}

impl TtsError {
    /// Short machine-readable kind tag used in error response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            TtsError::InvalidRequest { .. } => "invalid_request",
            TtsError::VoiceUnknown { .. } => "voice_unknown",
            TtsError::ChunkTooLarge { .. } => "chunk_too_large",
            TtsError::BackendTransient { .. } => "backend_transient",
            TtsError::BackendDefinitive { .. } => "backend_definitive",
            TtsError::StitchFailure { .. } => "stitch_failure",
            TtsError::EncodeFailure { .. } => "encode_failure",
            TtsError::Cancelled => "cancelled",
        }
    }

    /// HTTP status the error surfaces as when it escapes the pipeline
    pub fn status(&self) -> u16 {
        match self {
            TtsError::InvalidRequest { .. } => 400,
            TtsError::VoiceUnknown { .. } => 404,
            TtsError::ChunkTooLarge { .. } => 413,
            TtsError::BackendTransient { .. } => 502,
            TtsError::BackendDefinitive { .. } => 502,
            TtsError::StitchFailure { .. } => 500,
            TtsError::EncodeFailure { .. } => 500,
            // Cancelled requests never produce a response body; 499 is
            // only used when one is forced out anyway.
            TtsError::Cancelled => 499,
        }
    }

    /// Whether the router may retry this failure on the next adapter
    pub fn is_transient(&self) -> bool {
        matches!(self, TtsError::BackendTransient { .. })
    }

    /// Whether this failure skips the adapter without marking it down
    pub fn is_definitive(&self) -> bool {
        matches!(self, TtsError::BackendDefinitive { .. })
    }

    /// Classify a reqwest failure against one backend
    pub fn from_upstream(kind: BackendKind, err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return TtsError::BackendDefinitive {
                    kind,
                    message: format!("authentication refused ({status})"),
                };
            }
            if status.is_client_error() {
                return TtsError::BackendDefinitive {
                    kind,
                    message: format!("upstream returned {status}"),
                };
            }
        }
        TtsError::BackendTransient {
            kind,
            message: err.to_string(),
        }
    }
}
