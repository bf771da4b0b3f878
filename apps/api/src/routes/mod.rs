pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::explore::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Explore API
        .route(
            "/api/v1/explore/sessions",
            post(handlers::handle_create_session),
        )
        .route(
            "/api/v1/explore/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_close_session),
        )
        .route(
            "/api/v1/explore/sessions/:id/query",
            post(handlers::handle_submit_query),
        )
        .route(
            "/api/v1/explore/sessions/:id/filters",
            put(handlers::handle_set_filters),
        )
        .route(
            "/api/v1/explore/sessions/:id/clear",
            post(handlers::handle_clear_query),
        )
        .route(
            "/api/v1/explore/sessions/:id/clear-filters",
            post(handlers::handle_clear_filters),
        )
        .route(
            "/api/v1/explore/sessions/:id/load-more",
            post(handlers::handle_load_more),
        )
        .route(
            "/api/v1/explore/sessions/:id/refresh",
            post(handlers::handle_refresh),
        )
        .route(
            "/api/v1/explore/sessions/:id/facets",
            get(handlers::handle_get_facets),
        )
        .with_state(state)
}
