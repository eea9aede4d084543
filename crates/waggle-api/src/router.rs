//! Axum router construction for the Waggle API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::ApiState;

/// Build the complete Axum router for the API server.
///
/// Routes:
/// - `POST /api/tick` -- trigger a round (shared-secret guarded)
/// - `GET /api/status` -- driver status
/// - `GET /api/notifications` -- prefs-filtered notification listing
/// - `GET /api/notifications/unread-count` -- unfiltered unread count
/// - `GET /api/agents/{id}/report` -- daily activity report
///
/// CORS is configured to allow any origin for development.
pub fn build_router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/tick", post(handlers::trigger_tick))
        .route("/api/status", get(handlers::status))
        .route("/api/notifications", get(handlers::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(handlers::unread_count),
        )
        .route("/api/agents/{id}/report", get(handlers::agent_report))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
