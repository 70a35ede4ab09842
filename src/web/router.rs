use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers::{
    clear_handler, download_handler, health_handler, index_handler, languages_handler,
    login_handler, transcribe_handler,
};
use super::state::AppState;

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(index_handler))
        .route("/login", post(login_handler))
        .route("/transcribe", post(transcribe_handler))
        .route("/download", get(download_handler))
        .route("/clear", post(clear_handler))
        .route("/health", get(health_handler))
        .route("/api/languages", get(languages_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(trace_layer)
        .with_state(state)
}
