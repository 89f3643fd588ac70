//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Index status
        .route("/status", get(handlers::status))
        // Streamed question answering
        .route("/ask", post(handlers::ask))
        .with_state(state)
}

/// Full application router with everything nested under `/api`
pub fn app_router(state: AppState) -> Router {
    Router::new().nest("/api", api_routes(state))
}
