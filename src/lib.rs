// ============================================================================
// YATUBE REST API
// ============================================================================

// - Posts, optionally filed under read-only groups
// - Comments scoped under posts
// - Follows between users, searchable by username
// - JWT signup/login/refresh
// - Author-only edits through permission policies
// - Limit/offset pagination

pub mod auth;
pub mod config;
pub mod dto;
pub mod errors;
pub mod models;
pub mod pagination;
pub mod permissions;
pub mod routes;
pub mod seed;
pub mod states;
pub mod store;
pub mod throttle;

pub use states::AppState;

use axum::{Router, extract::DefaultBodyLimit};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// The full service: routes plus tracing, CORS and the body size cap.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(body_limit)),
    )
}
