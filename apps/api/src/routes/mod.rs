pub mod health;
pub mod matching;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Match scoring API
        .route(
            "/api/v1/matches/compute",
            post(matching::handle_compute_match),
        )
        .route("/api/v1/matches/cached", get(matching::handle_get_cached))
        .route("/api/v1/matches/cache", delete(matching::handle_invalidate))
        .with_state(state)
}
