//! # HTTP Client Utilities
//!
//! Shared HTTP client for web quote sources.
//!
//! Wraps a `reqwest::Client` configured with the fetch timeout and a
//! browser user agent, and maps transport failures and HTTP statuses onto
//! [`SourceError`].
//!
//! # Examples
//!
//! ```ignore
//! use quote_consensus::infrastructure::sources::http_client::HttpClient;
//!
//! let client = HttpClient::new(10_000, "Mozilla/5.0")?;
//! let page = client.get_text("https://www.dolarhoy.com").await?;
//! ```

use crate::infrastructure::sources::error::{SourceError, SourceResult};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest error body kept in error messages.
const MAX_ERROR_BODY: usize = 200;

/// HTTP client wrapper for quote sources.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Inner reqwest client.
    client: Client,
    /// Request timeout in milliseconds.
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a new HTTP client with the given timeout and user agent.
    ///
    /// HTML and JSON are both accepted, with Spanish and Portuguese
    /// preferred so regional sites serve their localized markup.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Internal` if the client cannot be created.
    pub fn new(timeout_ms: u64, user_agent: &str) -> SourceResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("es-AR,es;q=0.9,pt-BR;q=0.8,en;q=0.7"),
        );

        Self::with_headers(timeout_ms, user_agent, headers)
    }

    /// Creates a new HTTP client with custom default headers.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Internal` if the client cannot be created.
    pub fn with_headers(
        timeout_ms: u64,
        user_agent: &str,
        default_headers: HeaderMap,
    ) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(user_agent)
            .default_headers(default_headers)
            .build()
            .map_err(|e| SourceError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout_ms })
    }

    /// Returns the configured timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Makes a GET request and returns the response body as text.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Timeout` or `SourceError::Connection` if the
    /// request fails, and the status-specific variant for non-2xx answers.
    pub async fn get_text(&self, url: &str) -> SourceResult<String> {
        let response = self.send(url).await?;
        response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e))
    }

    /// Makes a GET request and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::get_text`], plus `SourceError::QuoteNotFound`
    /// if the body is not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> SourceResult<T> {
        let response = self.send(url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::quote_not_found(format!("Failed to parse response: {}", e)))
    }

    async fn send(&self, url: &str) -> SourceResult<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after_ms = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));
        let body = response.text().await.unwrap_or_default();
        Err(self.map_status_error(status, truncate(&body), retry_after_ms))
    }

    /// Maps a reqwest error to a SourceError.
    fn map_reqwest_error(&self, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::timeout_with_duration("Request timed out", self.timeout_ms)
        } else if error.is_connect() {
            SourceError::connection(format!("Connection failed: {}", error))
        } else {
            SourceError::connection(format!("HTTP request failed: {}", error))
        }
    }

    /// Maps an HTTP status code to a SourceError.
    fn map_status_error(
        &self,
        status: StatusCode,
        body: &str,
        retry_after_ms: Option<u64>,
    ) -> SourceError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => match retry_after_ms {
                Some(ms) => SourceError::rate_limited_with_retry("Rate limit exceeded", ms),
                None => SourceError::rate_limited("Rate limit exceeded"),
            },
            _ => SourceError::http_status(status.as_u16(), body),
        }
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => body.get(..idx).unwrap_or(body),
        None => body,
    }
}
