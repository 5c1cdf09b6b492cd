//! # REST Routes
//!
//! Router construction.

use crate::api::rest::handlers::{self, AppState};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router with tracing and permissive CORS.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::service_info))
        .route("/health", get(handlers::health))
        .route("/quotes", get(handlers::get_quotes))
        .route("/average", get(handlers::get_average))
        .route("/slippage", get(handlers::get_slippage))
        .route("/historical", get(handlers::get_historical))
        .route(
            "/region",
            get(handlers::get_region).put(handlers::change_region),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
