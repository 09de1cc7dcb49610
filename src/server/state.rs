//! Shared application state
//!
//! One explicit value threaded through every handler: configuration,
//! the adapter set behind the router, the voice catalog, preferences
//! and the pipeline. Built once at startup; no hidden globals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::adapters::{self, RegisteredAdapter};
use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::router::Router;
use crate::voice::{Voice, VoicePreferences, VoiceRegistry};

/// Time allowed for one backend's voice-list query during catalog builds
const VOICE_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between health-probe sweeps over down adapters
const PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Process-wide state shared across handlers
pub struct AppState {
    pub config: Config,
    pub router: Arc<Router>,
    pub registry: Arc<VoiceRegistry>,
    pub prefs: Arc<VoicePreferences>,
    pub pipeline: Pipeline,
    pub start_time: Instant,
}

impl AppState {
    /// Build all components and take the initial catalog snapshot
    pub async fn initialize(config: Config) -> Arc<Self> {
        if let Err(e) = config.ensure_dirs() {
            warn!("could not create data directories: {e}");
        }

        let adapter_set = adapters::build_adapters(&config);
        info!("registered {} backend adapters", adapter_set.len());

        // Fall back to the first registered adapter when the configured
        // default did not come up
        let default_backend = if adapter_set.iter().any(|a| a.kind() == config.default_backend) {
            config.default_backend
        } else {
            let fallback = adapter_set
                .first()
                .map(|a| a.kind())
                .unwrap_or(config.default_backend);
            if fallback != config.default_backend {
                warn!(
                    "default backend {} not registered, using {}",
                    config.default_backend, fallback
                );
            }
            fallback
        };

        let router = Arc::new(Router::new(adapter_set, default_backend));
        let registry = Arc::new(VoiceRegistry::new(&config.voice_dir));
        let backend_voices = collect_backend_voices(router.adapters()).await;
        registry.rebuild(backend_voices);

        let prefs = Arc::new(VoicePreferences::load(&config.prefs_file));
        let pipeline = Pipeline::new(
            router.clone(),
            registry.clone(),
            prefs.clone(),
            config.chunk_parallelism,
        );

        Arc::new(Self {
            config,
            router,
            registry,
            prefs,
            pipeline,
            start_time: Instant::now(),
        })
    }

    /// Re-scan the clone directory and re-query backend catalogs
    pub async fn reload_voices(&self) -> usize {
        let backend_voices = collect_backend_voices(self.router.adapters()).await;
        self.registry.rebuild(backend_voices)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Query every adapter's voice list; failures are logged and skipped
async fn collect_backend_voices(adapters: &[Arc<RegisteredAdapter>]) -> Vec<Voice> {
    let mut voices = Vec::new();
    for adapter in adapters {
        match tokio::time::timeout(VOICE_LIST_TIMEOUT, adapter.backend.list_voices()).await {
            Ok(Ok(listed)) => {
                if !listed.is_empty() {
                    info!("backend {} reports {} voices", adapter.kind(), listed.len());
                }
                voices.extend(listed);
            }
            Ok(Err(e)) => warn!("voice list from {} failed: {e}", adapter.kind()),
            Err(_) => warn!("voice list from {} timed out", adapter.kind()),
        }
    }
    voices
}

/// Periodically probe down adapters so they can recover
pub fn spawn_health_probes(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(PROBE_INTERVAL).await;
            for adapter in state.router.adapters() {
                if !adapter.health.probe_due() {
                    continue;
                }
                if adapter.backend.probe().await {
                    info!("backend {} is back up", adapter.kind());
                    adapter.health.record_success();
                }
            }
        }
    });
}
