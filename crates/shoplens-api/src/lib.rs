//! ShopLens analytics HTTP API.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router over `state`.
pub fn build_router(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the storefront origins once they are configurable.
    Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::track::router())
        .nest("/api/analyze", routes::analyze::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
