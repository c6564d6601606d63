//! SQLite-based cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use filings_core::{FactsCache, FilingsError, Result, Ticker, XbrlData};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

/// SQLite-based cache for company facts.
///
/// Each (provider, ticker) pair stores one JSON document of [`XbrlData`],
/// persisted across application restarts.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Create a new SQLite cache at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| FilingsError::Cache(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| FilingsError::Cache(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS facts_cache (
                provider TEXT NOT NULL,
                ticker TEXT NOT NULL,
                data_json TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (provider, ticker)
            )",
            [],
        )
        .map_err(|e| FilingsError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_facts_cached_at ON facts_cache(cached_at)",
            [],
        )
        .map_err(|e| FilingsError::Cache(e.to_string()))?;

        Ok(())
    }

    /// Tickers cached for a provider, sorted.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn cached_tickers(&self, provider: &str) -> Result<Vec<Ticker>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        let mut stmt = conn
            .prepare("SELECT ticker FROM facts_cache WHERE provider = ?1 ORDER BY ticker")
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        let rows = stmt
            .query_map(params![provider], |row| row.get::<_, String>(0))
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        rows.map(|row| {
            row.map(Ticker::new)
                .map_err(|e| FilingsError::Cache(e.to_string()))
        })
        .collect()
    }
}

#[async_trait]
impl FactsCache for SqliteCache {
    #[instrument(skip(self), fields(provider = %provider, ticker = %ticker))]
    async fn get_facts(&self, provider: &str, ticker: &Ticker) -> Result<Option<XbrlData>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        let result = conn
            .query_row(
                "SELECT data_json FROM facts_cache WHERE provider = ?1 AND ticker = ?2",
                params![provider, ticker.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        match result {
            Some(json) => {
                let data: XbrlData = serde_json::from_str(&json)
                    .map_err(|e| FilingsError::Parse(e.to_string()))?;
                debug!("Found cached company facts");
                Ok(Some(data))
            }
            None => {
                debug!("No cached company facts found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, data), fields(provider = %provider, ticker = %ticker))]
    async fn put_facts(&self, provider: &str, ticker: &Ticker, data: &XbrlData) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();
        let data_json =
            serde_json::to_string(data).map_err(|e| FilingsError::Parse(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO facts_cache (provider, ticker, data_json, cached_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![provider, ticker.as_str(), data_json, cached_at],
        )
        .map_err(|e| FilingsError::Cache(e.to_string()))?;

        debug!("Cached {} facts", data.fact_count());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl)
                .map_err(|e| FilingsError::Cache(format!("Invalid TTL duration: {}", e)))?;
        let cutoff_str = cutoff.to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        let deleted = conn
            .execute(
                "DELETE FROM facts_cache WHERE cached_at < ?1",
                params![cutoff_str],
            )
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        if deleted > 0 {
            debug!("Invalidated {} stale cache entries", deleted);
        }

        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        conn.execute("DELETE FROM facts_cache", [])
            .map_err(|e| FilingsError::Cache(e.to_string()))?;

        debug!("Cleared all cache entries");
        Ok(())
    }
}
