//! HTTP boundary: router wiring, shared state, error mapping

mod errors;
mod handlers;
mod state;

pub use errors::HttpError;
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Builds the API router. Browser clients call this cross-origin, so the
/// CORS layer stays permissive.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/optimize", post(handlers::optimize))
        .route(
            "/api/history",
            get(handlers::history_list).delete(handlers::history_delete),
        )
        .route("/api/stats", get(handlers::dashboard_stats))
        .layer(cors)
        .with_state(state)
}
