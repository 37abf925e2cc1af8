use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Listening control
        .route("/listen/start", post(handlers::start_listening))
        .route("/listen/stop", post(handlers::stop_listening))
        .route("/listen/enabled", post(handlers::set_enabled))
        // Display queries
        .route("/state", get(handlers::get_state))
        .route("/messages", get(handlers::get_messages))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        // The display runs in a browser on another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
