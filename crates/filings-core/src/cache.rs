//! Cache trait for storing fetched company facts.
//!
//! This module defines the [`FactsCache`] trait that provides a unified interface
//! for caching [`XbrlData`] per source and ticker.

use async_trait::async_trait;
use std::time::Duration;

use crate::{
    error::Result,
    types::{Ticker, XbrlData},
};

/// Trait for caching fetched company facts.
///
/// Implementations can store data in various backends (SQLite, in-memory, etc.)
/// to avoid repeated requests to EDGAR.
#[async_trait]
pub trait FactsCache: Send + Sync {
    /// Retrieves cached facts for a ticker from a given source.
    ///
    /// Returns `Ok(Some(data))` if cached data exists, `Ok(None)` if not cached.
    async fn get_facts(&self, provider: &str, ticker: &Ticker) -> Result<Option<XbrlData>>;

    /// Stores facts in the cache, replacing any previous entry.
    async fn put_facts(&self, provider: &str, ticker: &Ticker, data: &XbrlData) -> Result<()>;

    /// Removes cache entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
