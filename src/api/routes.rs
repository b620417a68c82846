use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Blends
        .route(
            "/api/mixes",
            get(handlers::list_blends).post(handlers::create_blend),
        )
        .route("/api/mixes/:id/like", post(handlers::toggle_like))
        // Recommendations
        .route("/api/recommendations", get(handlers::recommendations))
        // Catalog
        .route("/api/flavors", get(handlers::list_flavors))
        .route("/api/brands", post(handlers::create_brand))
        .route("/api/brands/:brand/flavors", post(handlers::create_flavor))
        // Moderation word list
        .route(
            "/api/moderation",
            get(handlers::list_moderation).post(handlers::add_moderation_word),
        )
        .route(
            "/api/moderation/:word",
            delete(handlers::remove_moderation_word),
        )
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
