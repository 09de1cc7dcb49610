//! HTTP server
//!
//! Binds the OpenAI-compatible surface onto the pipeline. All state is
//! one explicit `AppState` value; handlers hold nothing else.

pub mod routes;
pub mod state;
pub mod types;

pub use state::AppState;

use std::sync::Arc;

use tracing::info;

use crate::config::Config;

/// Initialize state, start health probing and serve until shutdown
pub async fn run(config: Config) -> anyhow::Result<()> {
    let bind = format!("{}:{}", config.host, config.port);
    let state = AppState::initialize(config).await;

    for adapter in state.router.adapters() {
        let status = if adapter.backend.probe().await {
            adapter.health.record_success();
            "available"
        } else {
            "offline"
        };
        info!("backend {}: {status}", adapter.kind());
    }

    state::spawn_health_probes(state.clone());

    let app = routes::create_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(
        "unified-tts listening on {bind} ({} voices, {} backends)",
        state.registry.count(),
        state.router.adapters().len()
    );
    axum::serve(listener, app).await?;
    Ok(())
}
