//! # REST Handlers
//!
//! Request handlers, shared state and the JSON envelopes.
//!
//! Successful responses are wrapped as `{success: true, data, count?}`;
//! failures as `{success: false, error: {code, message}}`.

use crate::application::error::ApplicationError;
use crate::application::services::quote_aggregation::AggregationError;
use crate::application::services::quote_service::QuoteService;
use crate::domain::entities::aggregate::{AverageSummary, SlippageRecord, SourceFailure};
use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::{Region, Timestamp};
use crate::infrastructure::persistence::traits::StoredQuote;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

// ============================================================================
// State
// ============================================================================

/// Shared handler state.
#[derive(Debug)]
pub struct AppState {
    /// Quote facade.
    pub service: Arc<QuoteService>,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Creates state for `service`, starting the uptime clock now.
    #[must_use]
    pub fn new(service: Arc<QuoteService>) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// Success envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// Payload.
    pub data: T,
    /// Item count for list payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    /// Wraps a single value.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Wraps a list, adding its length.
    #[must_use]
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            data,
        }
    }
}

/// Error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Error details.
    pub error: ErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `ALL_SOURCES_FAILED`.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Per-source diagnostics when every source failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<Vec<SourceFailure>>,
    /// Requested path, for unknown routes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Application failure.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// No route matched.
    #[error("route not found")]
    NotFound {
        /// Requested path.
        path: String,
    },
}

impl ApiError {
    /// Returns the HTTP status and error code.
    #[must_use]
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Application(e) => match e {
                ApplicationError::Aggregation(AggregationError::AllSourcesFailed { .. }) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "ALL_SOURCES_FAILED")
                }
                ApplicationError::Aggregation(AggregationError::NoSourcesForRegion(_)) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "NO_SOURCES_FOR_REGION")
                }
                ApplicationError::InvalidRegion(_) => (StatusCode::BAD_REQUEST, "INVALID_REGION"),
                ApplicationError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR")
                }
                ApplicationError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, error = %self, "request failed");
        }

        let failures = match &self {
            Self::Application(ApplicationError::Aggregation(e)) if e.is_all_sources_failed() => {
                Some(e.failures().to_vec())
            }
            _ => None,
        };
        let path = match &self {
            Self::NotFound { path } => Some(path.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code,
                message: self.to_string(),
                failures,
                path,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request types
// ============================================================================

/// `?refresh=` parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshParams {
    /// `true` or `1` bypasses the cache.
    pub refresh: Option<String>,
}

impl RefreshParams {
    /// Returns true if the caller asked for fresh data.
    #[must_use]
    pub fn force_refresh(&self) -> bool {
        self.refresh
            .as_deref()
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }
}

/// `?limit=` parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    /// Maximum rows; unparsable values fall back to the default.
    pub limit: Option<String>,
}

impl HistoryParams {
    /// Returns the parsed limit, if any.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        self.limit.as_deref().and_then(|v| v.trim().parse().ok())
    }
}

/// Body of `PUT /region`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRegionRequest {
    /// Region code, case-insensitive.
    pub region: String,
}

// ============================================================================
// Response types
// ============================================================================

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `true`.
    pub success: bool,
    /// `healthy`.
    pub status: &'static str,
    /// Active region.
    pub region: Region,
    /// Current time.
    pub timestamp: Timestamp,
    /// Seconds since startup.
    pub uptime_secs: u64,
}

/// Active region and its currency pair.
#[derive(Debug, Clone, Serialize)]
pub struct RegionResponse {
    /// Region code.
    pub region: Region,
    /// e.g. `USD/ARS`.
    pub currency_pair: &'static str,
}

impl From<Region> for RegionResponse {
    fn from(region: Region) -> Self {
        Self {
            region,
            currency_pair: region.currency_pair(),
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    /// Always `true`.
    pub success: bool,
    /// Service name.
    pub message: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Active region.
    pub region: Region,
    /// Active currency pair.
    pub currency_pair: &'static str,
    /// Available endpoints.
    pub endpoints: Endpoints,
}

/// Endpoint paths listed by `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct Endpoints {
    /// Quotes.
    pub quotes: &'static str,
    /// Averages.
    pub average: &'static str,
    /// Slippage.
    pub slippage: &'static str,
    /// History.
    pub historical: &'static str,
    /// Region switch.
    pub region: &'static str,
    /// Health.
    pub health: &'static str,
}

const ENDPOINTS: Endpoints = Endpoints {
    quotes: "/quotes",
    average: "/average",
    slippage: "/slippage",
    historical: "/historical",
    region: "/region",
    health: "/health",
};

// ============================================================================
// Handlers
// ============================================================================

/// `GET /`
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    let region = state.service.active_region();
    Json(ServiceInfo {
        success: true,
        message: "Currency Exchange Rate API",
        version: env!("CARGO_PKG_VERSION"),
        region,
        currency_pair: region.currency_pair(),
        endpoints: ENDPOINTS,
    })
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "healthy",
        region: state.service.active_region(),
        timestamp: Timestamp::now(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// `GET /quotes`
///
/// # Errors
///
/// Fails if aggregation fails.
pub async fn get_quotes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
) -> ApiResult<Json<ApiResponse<Vec<Quote>>>> {
    let region = state.service.active_region();
    let quotes = state
        .service
        .quotes(region, params.force_refresh())
        .await?;
    Ok(Json(ApiResponse::list(quotes)))
}

/// `GET /average`
///
/// # Errors
///
/// Fails if aggregation fails.
pub async fn get_average(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
) -> ApiResult<Json<ApiResponse<AverageSummary>>> {
    let region = state.service.active_region();
    let average = state
        .service
        .average(region, params.force_refresh())
        .await?;
    Ok(Json(ApiResponse::ok(average)))
}

/// `GET /slippage`
///
/// # Errors
///
/// Fails if aggregation fails.
pub async fn get_slippage(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
) -> ApiResult<Json<ApiResponse<Vec<SlippageRecord>>>> {
    let region = state.service.active_region();
    let slippage = state
        .service
        .slippage(region, params.force_refresh())
        .await?;
    Ok(Json(ApiResponse::list(slippage)))
}

/// `GET /historical`
///
/// # Errors
///
/// Fails if the quote store cannot be read.
pub async fn get_historical(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<ApiResponse<Vec<StoredQuote>>>> {
    let quotes = state.service.historical(params.limit()).await?;
    Ok(Json(ApiResponse::list(quotes)))
}

/// `GET /region`
pub async fn get_region(State(state): State<Arc<AppState>>) -> Json<ApiResponse<RegionResponse>> {
    Json(ApiResponse::ok(state.service.active_region().into()))
}

/// `PUT /region`
///
/// # Errors
///
/// Fails with `INVALID_REGION` for unknown or unconfigured regions and with
/// `BAD_REQUEST` for a malformed body.
pub async fn change_region(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChangeRegionRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<RegionResponse>>> {
    let Json(request) = payload?;
    let region = state.service.change_region(&request.region)?;
    Ok(Json(ApiResponse::ok(region.into())))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        path: uri.path().to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SourceId;

    #[test]
    fn refresh_flag_parsing() {
        let params = |v: Option<&str>| RefreshParams {
            refresh: v.map(str::to_string),
        };
        assert!(params(Some("true")).force_refresh());
        assert!(params(Some("TRUE")).force_refresh());
        assert!(params(Some("1")).force_refresh());
        assert!(!params(Some("false")).force_refresh());
        assert!(!params(Some("yes")).force_refresh());
        assert!(!params(None).force_refresh());
    }

    #[test]
    fn history_limit_parsing() {
        let params = |v: &str| HistoryParams {
            limit: Some(v.to_string()),
        };
        assert_eq!(params("25").limit(), Some(25));
        assert_eq!(params("abc").limit(), None);
        assert_eq!(params("-3").limit(), None);
        assert_eq!(HistoryParams::default().limit(), None);
    }

    #[test]
    fn list_envelope_has_count() {
        let json = serde_json::to_value(ApiResponse::list(vec![1, 2, 3])).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 3);

        let json = serde_json::to_value(ApiResponse::ok("x")).unwrap();
        assert!(json.get("count").is_none());
    }

    #[test]
    fn error_status_mapping() {
        let all_failed = ApiError::from(ApplicationError::from(AggregationError::AllSourcesFailed {
            region: Region::Ars,
            failures: vec![SourceFailure::new(SourceId::new("a"), "down", 2)],
        }));
        assert_eq!(
            all_failed.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "ALL_SOURCES_FAILED")
        );

        let no_sources = ApiError::from(ApplicationError::from(
            AggregationError::NoSourcesForRegion(Region::Brl),
        ));
        assert_eq!(
            no_sources.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "NO_SOURCES_FOR_REGION")
        );

        let invalid = ApiError::from(ApplicationError::invalid_region("EUR"));
        assert_eq!(
            invalid.status_and_code(),
            (StatusCode::BAD_REQUEST, "INVALID_REGION")
        );

        let missing = ApiError::NotFound { path: "/x".into() };
        assert_eq!(missing.status_and_code().0, StatusCode::NOT_FOUND);
    }
}
