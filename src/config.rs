//! Gateway configuration
//!
//! All settings come from the environment. Backend endpoints default
//! to the conventional local ports so a stock installation needs no
//! configuration at all; the cloud adapter activates only when its API
//! key is present.

use std::path::PathBuf;
use std::time::Duration;

use crate::profiles::BackendKind;

/// Default bind port for the gateway
const DEFAULT_PORT: u16 = 8765;

/// Default per-adapter synthesis call timeout
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default cap on concurrent chunk synthesis across all requests
const DEFAULT_CHUNK_PARALLELISM: usize = 8;

/// Runtime configuration read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Directory scanned for voice-clone reference assets
    pub voice_dir: PathBuf,
    /// Path of the persisted voice → backend preference map
    pub prefs_file: PathBuf,
    /// Backend used when no affinity rule selects one
    pub default_backend: BackendKind,
    /// Global ceiling on concurrent chunk synthesis calls
    pub chunk_parallelism: usize,
    /// ElevenLabs API key; the adapter is disabled when empty
    pub elevenlabs_api_key: String,
}

impl Config {
    /// Build configuration from environment variables
    pub fn from_env() -> Self {
        let home_base = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".unified-tts");

        let voice_dir = std::env::var("UNIFIED_TTS_VOICE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_base.join("voices"));

        let prefs_file = std::env::var("UNIFIED_TTS_PREFS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_base.join("voice_prefs.json"));

        let default_backend = std::env::var("UNIFIED_TTS_DEFAULT_BACKEND")
            .ok()
            .and_then(|s| BackendKind::parse(&s))
            .unwrap_or(BackendKind::Kokoro);

        Self {
            host: std::env::var("UNIFIED_TTS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("UNIFIED_TTS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            voice_dir,
            prefs_file,
            default_backend,
            chunk_parallelism: std::env::var("UNIFIED_TTS_CHUNK_PARALLELISM")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_CHUNK_PARALLELISM),
            elevenlabs_api_key: std::env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
        }
    }

    /// Endpoint URL for a backend, `<BACKEND>_URL` override or the
    /// conventional local port
    pub fn backend_url(&self, kind: BackendKind) -> String {
        let var = format!("{}_URL", kind.as_str().to_uppercase());
        if let Ok(url) = std::env::var(&var) {
            return url.trim_end_matches('/').to_string();
        }
        let port = match kind {
            BackendKind::Kokoro => 8880,
            BackendKind::OpenAudio => 9877,
            BackendKind::VoxCpm => 7860,
            BackendKind::VoxCpm15 => 7870,
            BackendKind::Kyutai => 8899,
            BackendKind::Higgs => 8085,
            BackendKind::VibeVoice => 8086,
            // Hosted service, no local port
            BackendKind::ElevenLabs => 0,
        };
        if kind == BackendKind::ElevenLabs {
            "https://api.elevenlabs.io/v1".to_string()
        } else {
            format!("http://localhost:{port}")
        }
    }

    /// Synthesis call timeout for a backend kind,
    /// `<BACKEND>_TIMEOUT_SECS` override or the 60 s default
    pub fn call_timeout(&self, kind: BackendKind) -> Duration {
        let var = format!("{}_TIMEOUT_SECS", kind.as_str().to_uppercase());
        let secs = std::env::var(&var)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Whether a backend kind has enough configuration to be used
    pub fn is_configured(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::ElevenLabs => !self.elevenlabs_api_key.is_empty(),
            _ => true,
        }
    }

    /// Create the voice directory and the prefs file's parent if missing
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.voice_dir)?;
        if let Some(parent) = self.prefs_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backend_urls() {
        let config = Config {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            voice_dir: PathBuf::from("/tmp/voices"),
            prefs_file: PathBuf::from("/tmp/prefs.json"),
            default_backend: BackendKind::Kokoro,
            chunk_parallelism: DEFAULT_CHUNK_PARALLELISM,
            elevenlabs_api_key: String::new(),
        };
        assert_eq!(config.backend_url(BackendKind::Kokoro), "http://localhost:8880");
        assert_eq!(
            config.backend_url(BackendKind::ElevenLabs),
            "https://api.elevenlabs.io/v1"
        );
        assert!(!config.is_configured(BackendKind::ElevenLabs));
        assert!(config.is_configured(BackendKind::OpenAudio));
    }
}
