//! Metric pipeline combining facts sources, a cache and extraction.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use filings_core::{
    Diagnostics, ExtractedRow, Extraction, FactsCache, FactsSource, FilingsError, MetricKey,
    Result, Ticker, XbrlData, extract_metrics_with, top_metrics,
};

use crate::config::PipelineConfig;

/// Fetches company facts and extracts metric rows from them.
///
/// Sources are tried in registration order until one succeeds. If a cache is
/// configured it is checked first and successful fetches are written back.
///
/// # Example
///
/// ```rust,ignore
/// use filings::{MetricPipeline, Ticker};
///
/// let pipeline = MetricPipeline::new().with_edgar("MyApp/1.0 (contact@example.com)");
///
/// let extraction = pipeline.extract(&Ticker::new("PLTR")).await?;
/// println!("{} rows, {} skipped", extraction.rows.len(), extraction.skipped.len());
/// ```
pub struct MetricPipeline {
    sources: Vec<Arc<dyn FactsSource>>,
    cache: Option<Arc<dyn FactsCache>>,
    cache_ttl: Option<Duration>,
    metrics: Vec<MetricKey>,
    diagnostics: Diagnostics,
}

impl Default for MetricPipeline {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            cache: None,
            cache_ttl: None,
            metrics: top_metrics(),
            diagnostics: Diagnostics::default(),
        }
    }
}

impl std::fmt::Debug for MetricPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricPipeline")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("cache", &self.cache.as_ref().map(|_| "configured"))
            .field("cache_ttl", &self.cache_ttl)
            .field("metrics", &self.metrics.len())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl MetricPipeline {
    /// Create a pipeline with no sources, no cache and the curated metric list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache for this pipeline.
    #[must_use]
    pub fn set_cache(mut self, cache: Arc<dyn FactsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Drop cached entries older than `ttl` before each lookup.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Replace the metrics to extract.
    #[must_use]
    pub fn with_metrics<I, M>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MetricKey>,
    {
        self.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    /// Set the diagnostics used during extraction.
    #[must_use]
    pub const fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Add a source, tried after any already registered.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn FactsSource>) -> Self {
        self.register_source(source);
        self
    }

    /// Register a facts source.
    pub fn register_source(&mut self, source: Arc<dyn FactsSource>) {
        debug!(source = source.name(), "Registering facts source");
        self.sources.push(source);
    }

    /// Metrics extracted by [`extract`](Self::extract).
    #[must_use]
    pub fn metrics(&self) -> &[MetricKey] {
        &self.metrics
    }

    /// Names of the registered sources, in fallback order.
    #[must_use]
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Fetch company facts, checking the cache before trying sources in order.
    pub async fn fetch_facts(&self, ticker: &Ticker) -> Result<XbrlData> {
        self.ensure_sources()?;

        if let Some(cache) = &self.cache {
            if let Some(ttl) = self.cache_ttl {
                if let Err(e) = cache.invalidate_stale(ttl).await {
                    warn!(error = %e, "Failed to invalidate stale cache entries");
                }
            }

            for source in &self.sources {
                match cache.get_facts(source.name(), ticker).await {
                    Ok(Some(cached)) => {
                        debug!(
                            source = source.name(),
                            ticker = %ticker,
                            "Cache hit for company facts"
                        );
                        return Ok(cached);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(source = source.name(), error = %e, "Failed to read cache");
                    }
                }
            }
        }

        self.fetch_from_sources(ticker).await
    }

    /// Fetch company facts from the sources, bypassing cached entries.
    ///
    /// The result still replaces the cached entry.
    pub async fn refresh_facts(&self, ticker: &Ticker) -> Result<XbrlData> {
        self.ensure_sources()?;
        self.fetch_from_sources(ticker).await
    }

    /// Fetch facts for a ticker and extract the configured metrics.
    pub async fn extract(&self, ticker: &Ticker) -> Result<Extraction> {
        let data = self.fetch_facts(ticker).await?;
        Ok(self.extract_from(&data))
    }

    /// Extract the configured metrics from already fetched facts.
    #[must_use]
    pub fn extract_from(&self, data: &XbrlData) -> Extraction {
        extract_metrics_with(data, &self.metrics, &self.diagnostics)
    }

    /// Fetch facts for a ticker and return the rows for the configured metrics.
    pub async fn extract_metrics_from_edgar_xbrl(&self, ticker: &Ticker) -> Result<Vec<ExtractedRow>> {
        let extraction = self.extract(ticker).await?;
        info!(
            ticker = %ticker,
            rows = extraction.rows.len(),
            skipped = extraction.skipped.len(),
            "Extracted metrics"
        );
        Ok(extraction.rows)
    }

    fn ensure_sources(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(FilingsError::ProviderNotConfigured(
                "No facts sources registered".to_string(),
            ));
        }
        Ok(())
    }

    async fn fetch_from_sources(&self, ticker: &Ticker) -> Result<XbrlData> {
        let mut last_error = None;
        for source in &self.sources {
            debug!(
                source = source.name(),
                ticker = %ticker,
                "Fetching company facts"
            );

            match source.fetch_facts(ticker).await {
                Ok(data) => {
                    if let Some(cache) = &self.cache {
                        if let Err(e) = cache.put_facts(source.name(), ticker, &data).await {
                            warn!(
                                source = source.name(),
                                error = %e,
                                "Failed to cache company facts"
                            );
                        }
                    }
                    return Ok(data);
                }
                Err(e) => {
                    warn!(
                        source = source.name(),
                        error = %e,
                        "Source failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FilingsError::Other("All sources failed with no error".to_string())))
    }

    /// Build a pipeline from configuration.
    ///
    /// Registers the SEC EDGAR source (feature `edgar`) and opens the SQLite
    /// cache (feature `cache-sqlite`) when a cache path is set.
    ///
    /// # Errors
    ///
    /// Returns [`FilingsError::ProviderNotConfigured`] without a User-Agent and
    /// [`FilingsError::Cache`] if the cache cannot be opened.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let pipeline = Self::new()
            .with_metrics(config.metrics.iter().cloned())
            .with_diagnostics(config.diagnostics);

        let pipeline = match config.cache_ttl() {
            Some(ttl) => pipeline.with_cache_ttl(ttl),
            None => pipeline,
        };

        #[cfg(feature = "cache-sqlite")]
        let pipeline = match &config.cache_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| FilingsError::Cache(e.to_string()))?;
                }
                debug!(path = %path.display(), "Opening facts cache");
                pipeline.set_cache(Arc::new(filings_cache::SqliteCache::new(path)?))
            }
            None => pipeline,
        };

        #[cfg(feature = "edgar")]
        let pipeline = {
            let client = filings_edgar::EdgarClient::new(config.user_agent()?)
                .with_rate_limit(config.rate_limit());
            pipeline.with_source(Arc::new(client))
        };

        Ok(pipeline)
    }

    /// Add the SEC EDGAR source.
    #[cfg(feature = "edgar")]
    #[must_use]
    pub fn with_edgar(self, user_agent: &str) -> Self {
        self.with_source(Arc::new(filings_edgar::EdgarClient::new(user_agent)))
    }
}

/// Fetch a ticker's company facts from SEC EDGAR and extract the curated metrics.
///
/// Uncached one-shot composition of [`MetricPipeline::with_edgar`] and
/// [`MetricPipeline::extract_metrics_from_edgar_xbrl`].
#[cfg(feature = "edgar")]
pub async fn extract_metrics_from_edgar_xbrl(
    ticker: &Ticker,
    user_agent: &str,
) -> Result<Vec<ExtractedRow>> {
    MetricPipeline::new()
        .with_edgar(user_agent)
        .extract_metrics_from_edgar_xbrl(ticker)
        .await
}
