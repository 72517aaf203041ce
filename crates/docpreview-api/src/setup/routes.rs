//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Setup all application routes
///
/// Every path other than `/health` reaches the conversion handler, and so
/// does any non-GET request to `/health`.
pub fn setup_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/health",
            get(handlers::health::health_check).fallback(handlers::convert::submit_job),
        )
        .fallback(handlers::convert::submit_job)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
