//! # SQLite Quote Store
//!
//! SQLite implementation of [`QuoteStore`] using sqlx.
//!
//! Observations are appended to a single `quotes` table. Timestamps are
//! stored as Unix milliseconds so ordering is a plain integer comparison.

use crate::domain::entities::quote::Quote;
use crate::domain::value_objects::{Region, SourceId, Timestamp};
use crate::infrastructure::persistence::traits::{
    QuoteStore, RepositoryError, RepositoryResult, StoredQuote,
};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// SQLite implementation of [`QuoteStore`].
///
/// # Examples
///
/// ```ignore
/// use quote_consensus::infrastructure::persistence::sqlite::SqliteQuoteStore;
///
/// let store = SqliteQuoteStore::connect("sqlite://data/quotes.db?mode=rwc").await?;
/// store.migrate().await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteQuoteStore {
    pool: SqlitePool,
}

impl SqliteQuoteStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`, creating the file and its parent
    /// directory when missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Connection` if the URL is invalid or the
    /// database cannot be opened.
    pub async fn connect(url: &str) -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| RepositoryError::connection(e.to_string()))?
            .create_if_missing(true);

        let parent = options
            .get_filename()
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        if let Some(parent) = parent {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::connection(e.to_string()))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Opens a private in-memory database.
    ///
    /// The pool holds a single connection that never expires, since every
    /// SQLite memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Connection` if the database cannot be opened.
    pub async fn in_memory() -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| RepositoryError::connection(e.to_string()))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Creates the `quotes` table and its index if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Query` if a statement fails.
    pub async fn migrate(&self) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quotes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                region TEXT NOT NULL,
                source TEXT NOT NULL,
                buy_price REAL NOT NULL,
                sell_price REAL NOT NULL,
                observed_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_quotes_region_observed_at ON quotes (region, observed_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        Ok(())
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl QuoteStore for SqliteQuoteStore {
    async fn append(&self, region: Region, quote: &Quote) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO quotes (region, source, buy_price, sell_price, observed_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(region.as_str())
        .bind(quote.source().as_str())
        .bind(quote.buy_price())
        .bind(quote.sell_price())
        .bind(quote.observed_at().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        Ok(())
    }

    async fn history(&self, region: Region, limit: u32) -> RepositoryResult<Vec<StoredQuote>> {
        let rows: Vec<QuoteRow> = sqlx::query_as(
            r#"
            SELECT id, region, source, buy_price, sell_price, observed_at
            FROM quotes
            WHERE region = ?
            ORDER BY observed_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(region.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::query(e.to_string()))?;

        rows.into_iter().map(QuoteRow::try_into_stored_quote).collect()
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quotes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::query(e.to_string()))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// Row type for quote queries.
#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: i64,
    region: String,
    source: String,
    buy_price: f64,
    sell_price: f64,
    observed_at: i64,
}

impl QuoteRow {
    fn try_into_stored_quote(self) -> RepositoryResult<StoredQuote> {
        let region = self
            .region
            .parse::<Region>()
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;
        let observed_at = Timestamp::from_millis(self.observed_at).ok_or_else(|| {
            RepositoryError::serialization(format!("invalid timestamp: {}", self.observed_at))
        })?;

        Ok(StoredQuote {
            id: self.id,
            region,
            source: SourceId::new(self.source),
            buy_price: self.buy_price,
            sell_price: self.sell_price,
            observed_at,
        })
    }
}
