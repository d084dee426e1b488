use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/sessions", post(handlers::start_session))
        .route(
            "/sessions/:session_id",
            get(handlers::get_session_status).delete(handlers::leave_session),
        )
        .route(
            "/sessions/:session_id/planning/finish",
            post(handlers::finish_planning),
        )
        .route(
            "/sessions/:session_id/slots/:phase/:index/lock",
            post(handlers::lock_slot),
        )
        .route(
            "/sessions/:session_id/immediate/start",
            post(handlers::start_immediate),
        )
        .route("/sessions/:session_id/finish", post(handlers::finish_session))
        // Request logging, and access from a browser front end
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
