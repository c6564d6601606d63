//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use filings_core::{FactsCache, Result, Ticker, XbrlData};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    cached_at: chrono::DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FactsKey {
    provider: String,
    ticker: String,
}

impl FactsKey {
    fn new(provider: &str, ticker: &Ticker) -> Self {
        Self {
            provider: provider.to_string(),
            ticker: ticker.to_string(),
        }
    }
}

/// Simple in-memory cache for testing and development.
///
/// Data is stored in a `RwLock`-protected `HashMap` and is lost when the cache
/// is dropped. Facts are cloned on get/put operations.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    facts: RwLock<HashMap<FactsKey, CacheEntry<XbrlData>>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.facts.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.facts.read().await.is_empty()
    }
}

#[async_trait]
impl FactsCache for InMemoryCache {
    #[instrument(skip(self), fields(provider = %provider, ticker = %ticker))]
    async fn get_facts(&self, provider: &str, ticker: &Ticker) -> Result<Option<XbrlData>> {
        let cache = self.facts.read().await;
        match cache.get(&FactsKey::new(provider, ticker)) {
            Some(entry) => {
                debug!("Cache hit for company facts");
                Ok(Some(entry.data.clone()))
            }
            None => {
                debug!("Cache miss for company facts");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, data), fields(provider = %provider, ticker = %ticker))]
    async fn put_facts(&self, provider: &str, ticker: &Ticker, data: &XbrlData) -> Result<()> {
        let mut cache = self.facts.write().await;
        cache.insert(FactsKey::new(provider, ticker), CacheEntry::new(data.clone()));
        debug!("Cached {} facts", data.fact_count());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut cache = self.facts.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.facts.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_core::{FilingFact, MetricKey};

    fn sample() -> XbrlData {
        let mut data = XbrlData::new();
        data.insert(
            "us-gaap",
            MetricKey::new("us-gaap_NetIncomeLoss_USD"),
            vec![FilingFact::new(100.0).with_filed("2024-02-02")],
        );
        data
    }

    #[tokio::test]
    async fn test_memory_cache_facts() {
        let cache = InMemoryCache::new();
        let ticker = Ticker::new("PLTR");

        // Initially no data
        assert!(cache.get_facts("edgar", &ticker).await.unwrap().is_none());

        cache.put_facts("edgar", &ticker, &sample()).await.unwrap();

        let cached = cache.get_facts("edgar", &ticker).await.unwrap();
        assert_eq!(cached, Some(sample()));

        // Keyed by provider as well as ticker
        assert!(cache.get_facts("other", &ticker).await.unwrap().is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_cache_invalidate_stale() {
        let cache = InMemoryCache::new();
        let ticker = Ticker::new("PLTR");
        cache.put_facts("edgar", &ticker, &sample()).await.unwrap();

        assert_eq!(
            cache
                .invalidate_stale(Duration::from_secs(3600))
                .await
                .unwrap(),
            0
        );

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_cache_clear() {
        let cache = InMemoryCache::new();
        cache
            .put_facts("edgar", &Ticker::new("PLTR"), &sample())
            .await
            .unwrap();
        cache
            .put_facts("edgar", &Ticker::new("AAPL"), &sample())
            .await
            .unwrap();

        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }
}
