//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Job control surface
        .route("/jobs", post(handlers::job::start_job))
        .route("/jobs", get(handlers::job::list_jobs))
        .route("/jobs/{id}", get(handlers::job::get_job))
        .route("/jobs/{id}", delete(handlers::job::evict_job))
        .route("/jobs/{id}/cancel", post(handlers::job::cancel_job))
        .route("/jobs/{id}/retry", post(handlers::job::retry_job))
        // Sequence catalog
        .route("/sequences", get(handlers::sequence::list_sequences));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
