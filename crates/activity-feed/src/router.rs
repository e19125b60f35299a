//! Axum router construction for the feed server.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled so a dashboard on another origin can subscribe.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::events;
use crate::handlers;
use crate::state::FeedState;

/// Build the complete Axum router for the feed server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /events` -- server-sent activity stream
/// - `GET /health` -- health check
pub fn build_router(state: Arc<FeedState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/events", get(events::events))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
