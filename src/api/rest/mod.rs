//! # REST API
//!
//! JSON endpoints over the quote service, built with axum.
//!
//! # Endpoints
//!
//! - `GET /` - Service information
//! - `GET /health` - Health check
//! - `GET /quotes?refresh=true` - Quotes of the active region
//! - `GET /average?refresh=true` - Average buy and sell prices
//! - `GET /slippage?refresh=true` - Per-source deviation from the average
//! - `GET /historical?limit=100` - Persisted quotes, newest first
//! - `GET /region` - Active region
//! - `PUT /region` - Change the active region, body `{"region": "BRL"}`
//!
//! # Usage
//!
//! ```ignore
//! use quote_consensus::api::rest::{create_router, AppState};
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::new(service));
//! let router = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    ApiError, ApiResponse, ApiResult, AppState, ChangeRegionRequest, ErrorBody, ErrorResponse,
    HealthResponse, HistoryParams, RefreshParams, RegionResponse, ServiceInfo,
};
pub use routes::create_router;
