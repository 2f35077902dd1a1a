pub mod error;
pub mod routes;
pub mod worker;

use std::sync::Arc;

use slideforge_common::AppConfig;
use slideforge_queue::JobQueueHandle;
use slideforge_store::JobStore;

/// Shared axum handler state.
pub struct AppState {
    pub store: Arc<JobStore>,
    pub queue: JobQueueHandle,
    pub config: Arc<AppConfig>,
}

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full router. Matches `rootsignal-server`/`rootsignal-api`'s
/// axum + tower-http wiring (CORS, request tracing). See spec §6.1.
pub fn build_router(state: Arc<AppState>) -> Router {
    let origins: Vec<axum::http::HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Router::new()
        .route("/api/generate", post(routes::generate))
        .route("/api/jobs/{jobId}", get(routes::get_job))
        .route("/api/jobs/{jobId}/preview.png", get(routes::get_preview))
        .route("/api/jobs/{jobId}/result.html", get(routes::get_result_html))
        .route("/healthz", get(routes::healthz))
        .layer(axum::extract::DefaultBodyLimit::max(12 * 1024 * 1024))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("x-download-key")]),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!("http_request", method = %request.method(), path = %request.uri().path())
            }),
        )
        .with_state(state)
}
