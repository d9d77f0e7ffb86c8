//! Route table.

use axum::{routing::get, Router};

use crate::handlers;
use crate::middleware::standard_middleware;
use crate::state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/posts",
            get(handlers::list_posts).post(handlers::submit_post),
        )
        .route(
            "/api/topic",
            get(handlers::current_topic).post(handlers::update_topic),
        )
        .route("/api/roles", get(handlers::list_roles))
        .route("/api/admins", get(handlers::list_admins))
        .route("/healthz", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    standard_middleware(api)
}
