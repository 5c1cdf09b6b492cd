//! # Configuration
//!
//! Application configuration, layered from lowest to highest precedence:
//!
//! 1. built-in defaults,
//! 2. an optional TOML file,
//! 3. environment variables prefixed `QUOTES__`, with `__` between keys
//!    (`QUOTES__REGION=BRL`, `QUOTES__CACHE__TTL_SECS=30`).
//!
//! # Examples
//!
//! ```
//! use quote_consensus::config::AppConfig;
//! use quote_consensus::domain::value_objects::Region;
//!
//! let config = AppConfig::default();
//! assert_eq!(config.region, Region::Ars);
//! assert_eq!(config.cache.ttl_secs, 60);
//! assert!(config.validate().is_ok());
//! ```

use crate::application::services::retry::{Backoff, RetryPolicy};
use crate::domain::value_objects::Region;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "QUOTES";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted key of the offending value.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Region active at startup.
    pub region: Region,
    /// HTTP server.
    pub server: ServerConfig,
    /// Quote cache.
    pub cache: CacheConfig,
    /// Source fetching.
    pub fetch: FetchConfig,
    /// Quote history storage.
    pub database: DatabaseConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads defaults, then `path` if it exists, then `QUOTES__*` variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source is malformed or a value fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`], reading variables from `env` instead of the
    /// process environment when given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source is malformed or a value fails
    /// validation.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config: Self = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(path = %path.display(), region = %config.region, "configuration loaded");
        Ok(config)
    }

    /// Parses a TOML document on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is malformed or a value fails
    /// validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::invalid("cache.ttl_secs", "must be positive"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::invalid("fetch.max_attempts", "must be positive"));
        }
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::invalid("fetch.timeout_ms", "must be positive"));
        }
        if self.database.queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "database.queue_capacity",
                "must be positive",
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::invalid("database.url", "must not be empty"));
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Returns `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Quote cache settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 60 }
    }
}

impl CacheConfig {
    /// Returns the entry lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Source fetch settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts per source, including the first.
    pub max_attempts: u32,
    /// Linear backoff base in milliseconds.
    pub base_delay_ms: u64,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User agent sent to sources.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 1_000,
            timeout_ms: 10_000,
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl FetchConfig {
    /// Returns the retry policy for source calls.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Backoff::linear(Duration::from_millis(self.base_delay_ms)),
        )
    }
}

/// Quote history storage settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    pub url: String,
    /// Capacity of the persistence queue, in batches.
    pub queue_capacity: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/quotes.db?mode=rwc".into(),
            queue_capacity: 256,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Installs the global tracing subscriber.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let installed = match self.format.as_str() {
            "json" => fmt().json().with_env_filter(filter).try_init(),
            _ => fmt().with_env_filter(filter).try_init(),
        };

        if installed.is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    }
}
