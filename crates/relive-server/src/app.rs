//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::live_reload::{self, LIVERELOAD_PATH};
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(live_reload::sse_handler))
        .merge(static_files::static_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
