//! No-op cache implementation.

use async_trait::async_trait;
use filings_core::{FactsCache, Result, Ticker, XbrlData};
use std::time::Duration;
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get_facts` always returns `Ok(None)` and `put_facts` returns `Ok(())`.
/// Useful for disabling caching.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FactsCache for NoopCache {
    async fn get_facts(&self, _provider: &str, _ticker: &Ticker) -> Result<Option<XbrlData>> {
        trace!("NoopCache: get_facts called, returning None");
        Ok(None)
    }

    async fn put_facts(&self, _provider: &str, _ticker: &Ticker, _data: &XbrlData) -> Result<()> {
        trace!("NoopCache: put_facts called, doing nothing");
        Ok(())
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_core::{FilingFact, MetricKey};

    #[tokio::test]
    async fn test_noop_never_returns_data() {
        let cache = NoopCache::new();
        let ticker = Ticker::new("PLTR");

        let mut data = XbrlData::new();
        data.insert(
            "us-gaap",
            MetricKey::new("us-gaap_Assets_USD"),
            vec![FilingFact::new(1.0)],
        );

        cache.put_facts("edgar", &ticker, &data).await.unwrap();
        assert!(cache.get_facts("edgar", &ticker).await.unwrap().is_none());
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 0);
        cache.clear().await.unwrap();
    }
}
