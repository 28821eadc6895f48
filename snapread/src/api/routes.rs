use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    // The framework cap only guards against oversized raw bodies; the
    // decoded 10 MiB ceiling is enforced by the pipeline itself (413).
    let max_body_bytes = state.config.limits.max_body_bytes();

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        // Mounted for every method: the pipeline owns the POST/OPTIONS
        // distinction and answers other methods with 400.
        .route("/api/v1/recognize", any(handlers::recognize))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
