//! Backend adapters
//!
//! One adapter per upstream engine family, all speaking the uniform
//! synthesis contract. The set is fixed at compile time; new engines
//! are new modules registered in `build_adapters`.

pub mod health;
pub mod traits;

pub mod elevenlabs;
pub mod higgs;
pub mod kokoro;
pub mod kyutai;
pub mod openaudio;
pub mod voxcpm;
pub mod voxcpm15;
pub mod vibevoice;

pub use health::{Availability, BackendHealth};
pub use traits::{SynthesisJob, SynthesizedAudio, TtsBackend};

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::profiles::BackendKind;

use crate::core::error::TtsError;

/// Map a non-success upstream status into the typed error set
///
/// 4xx means the backend understood and refused (definitive); 5xx and
/// everything else is worth retrying on another adapter.
pub(crate) fn upstream_error(
    kind: BackendKind,
    status: reqwest::StatusCode,
    body: &str,
) -> TtsError {
    let message = format!("{status}: {}", body.chars().take(200).collect::<String>());
    if status.is_client_error() {
        TtsError::BackendDefinitive { kind, message }
    } else {
        TtsError::BackendTransient { kind, message }
    }
}

/// An adapter with its runtime bookkeeping
pub struct RegisteredAdapter {
    pub backend: Box<dyn TtsBackend>,
    pub health: BackendHealth,
    /// Bounds concurrent in-flight calls against this upstream
    pub semaphore: Arc<tokio::sync::Semaphore>,
    /// Timeout applied to every synthesis call
    pub call_timeout: Duration,
}

impl std::fmt::Debug for RegisteredAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredAdapter")
            .field("kind", &self.backend.kind())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl RegisteredAdapter {
    pub fn new(backend: Box<dyn TtsBackend>, call_timeout: Duration) -> Arc<Self> {
        let permits = backend.max_concurrency();
        Arc::new(Self {
            backend,
            health: BackendHealth::new(),
            semaphore: Arc::new(tokio::sync::Semaphore::new(permits)),
            call_timeout,
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }
}

/// Construct every configured adapter, in the stable fallback order
///
/// An adapter that fails to initialize is logged and left out; the
/// server still starts with the rest.
pub fn build_adapters(config: &Config) -> Vec<Arc<RegisteredAdapter>> {
    let mut adapters = Vec::new();
    for kind in BackendKind::ALL {
        if !config.is_configured(kind) {
            info!("backend {kind} not configured, skipping");
            continue;
        }
        let url = config.backend_url(kind);
        let timeout = config.call_timeout(kind);
        let backend: anyhow::Result<Box<dyn TtsBackend>> = match kind {
            BackendKind::Kokoro => {
                kokoro::KokoroAdapter::new(url).map(|a| Box::new(a) as Box<dyn TtsBackend>)
            }
            BackendKind::OpenAudio => {
                openaudio::OpenAudioAdapter::new(url).map(|a| Box::new(a) as Box<dyn TtsBackend>)
            }
            BackendKind::VoxCpm15 => {
                voxcpm15::VoxCpm15Adapter::new(url).map(|a| Box::new(a) as Box<dyn TtsBackend>)
            }
            BackendKind::VoxCpm => {
                voxcpm::VoxCpmAdapter::new(url).map(|a| Box::new(a) as Box<dyn TtsBackend>)
            }
            BackendKind::Higgs => {
                higgs::HiggsAdapter::new(url).map(|a| Box::new(a) as Box<dyn TtsBackend>)
            }
            BackendKind::VibeVoice => {
                vibevoice::VibeVoiceAdapter::new(url).map(|a| Box::new(a) as Box<dyn TtsBackend>)
            }
            BackendKind::Kyutai => {
                kyutai::KyutaiAdapter::new(url).map(|a| Box::new(a) as Box<dyn TtsBackend>)
            }
            BackendKind::ElevenLabs => {
                elevenlabs::ElevenLabsAdapter::new(url, config.elevenlabs_api_key.clone())
                    .map(|a| Box::new(a) as Box<dyn TtsBackend>)
            }
        };
        match backend {
            Ok(backend) => adapters.push(RegisteredAdapter::new(backend, timeout)),
            Err(e) => warn!("adapter {kind} failed to initialize: {e}"),
        }
    }
    adapters
}
