//! HTTP routes

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Every artifact path answers GET and HEAD; `/health` comes first
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::lookup))
        .route("/{*path}", get(handlers::lookup))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
