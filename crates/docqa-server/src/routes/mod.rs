//! HTTP route handlers.

pub mod ask;
pub mod documents;
pub mod status;
pub mod upload;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(upload::routes())
        .merge(ask::routes())
        .merge(documents::routes())
        .merge(status::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
