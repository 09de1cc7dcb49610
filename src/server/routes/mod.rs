//! Route assembly

pub mod backends;
pub mod health;
pub mod models;
pub mod prefs;
pub mod speech;
pub mod voices;

use std::sync::Arc;

use axum::http::HeaderName;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::trace::TraceLayer;

use crate::server::state::AppState;

/// Build the full gateway router with middleware layers
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/v1/audio/speech", post(speech::create_speech))
        .route("/v1/voices", get(voices::list_voices))
        .route("/v1/voices/refresh", post(voices::refresh_voices))
        .route("/v1/models", get(models::list_models))
        .route("/v1/backends", get(backends::list_backends))
        .route("/v1/backends/switch", post(backends::switch_backend))
        .route("/v1/voice-prefs", get(prefs::get_prefs))
        .route(
            "/v1/voice-prefs/:voice",
            post(prefs::set_pref).delete(prefs::delete_pref),
        )
        .with_state(state)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
