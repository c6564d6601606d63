//! Pipeline configuration.
//!
//! [`PipelineConfig`] can be deserialized from JSON, read from the
//! environment, or built in code. Environment variables:
//!
//! | variable                 | field            |
//! |--------------------------|------------------|
//! | `SEC_USER_AGENT`         | `user_agent`     |
//! | `FILINGS_CACHE`          | `cache_path` (`off` disables) |
//! | `FILINGS_CACHE_TTL_SECS` | `cache_ttl_secs` |
//! | `FILINGS_RATE_LIMIT_MS`  | `rate_limit_ms`  |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use filings_core::{Diagnostics, FilingsError, MetricKey, Result, top_metrics};

/// Environment variable holding the SEC User-Agent.
pub const USER_AGENT_VAR: &str = "SEC_USER_AGENT";
/// Environment variable holding the cache path.
pub const CACHE_VAR: &str = "FILINGS_CACHE";
/// Environment variable holding the cache TTL in seconds.
pub const CACHE_TTL_VAR: &str = "FILINGS_CACHE_TTL_SECS";
/// Environment variable holding the request interval in milliseconds.
pub const RATE_LIMIT_VAR: &str = "FILINGS_RATE_LIMIT_MS";

/// Settings for building a [`MetricPipeline`](crate::MetricPipeline).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// User-Agent sent to the SEC, e.g. `MyApp/1.0 (contact@example.com)`.
    pub user_agent: Option<String>,
    /// Minimum interval between SEC requests in milliseconds.
    pub rate_limit_ms: u64,
    /// SQLite cache location. `None` disables caching.
    pub cache_path: Option<PathBuf>,
    /// Maximum age of cached facts in seconds. `None` keeps entries forever.
    pub cache_ttl_secs: Option<u64>,
    /// Metrics to extract, in output order.
    pub metrics: Vec<MetricKey>,
    /// Optional diagnostic events.
    pub diagnostics: Diagnostics,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            rate_limit_ms: 100,
            cache_path: Some(default_cache_path()),
            cache_ttl_secs: None,
            metrics: top_metrics(),
            diagnostics: Diagnostics::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`FilingsError::InvalidParameter`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`, keyed by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns [`FilingsError::InvalidParameter`] if a numeric value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_agent) = lookup(USER_AGENT_VAR).filter(|v| !v.trim().is_empty()) {
            config.user_agent = Some(user_agent);
        }

        if let Some(cache) = lookup(CACHE_VAR) {
            config.cache_path = match cache.trim() {
                "" | "off" | "none" => None,
                path => Some(PathBuf::from(path)),
            };
        }

        if let Some(ttl) = lookup(CACHE_TTL_VAR) {
            config.cache_ttl_secs = Some(parse_number(CACHE_TTL_VAR, &ttl)?);
        }

        if let Some(rate) = lookup(RATE_LIMIT_VAR) {
            config.rate_limit_ms = parse_number(RATE_LIMIT_VAR, &rate)?;
        }

        Ok(config)
    }

    /// Parses a JSON configuration document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FilingsError::Parse`] if the document is invalid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FilingsError::Parse(format!("Invalid config: {}", e)))
    }

    /// Returns the configured User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FilingsError::ProviderNotConfigured`] if none is set.
    pub fn user_agent(&self) -> Result<&str> {
        self.user_agent
            .as_deref()
            .filter(|ua| !ua.trim().is_empty())
            .ok_or_else(|| {
                FilingsError::ProviderNotConfigured(format!(
                    "SEC EDGAR requires a User-Agent; set {USER_AGENT_VAR}"
                ))
            })
    }

    /// Minimum interval between SEC requests.
    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Maximum age of cached facts.
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

/// Default SQLite cache location under the platform cache directory.
///
/// - Linux: `~/.cache/filings/facts.db`
/// - macOS: `~/Library/Caches/filings/facts.db`
/// - Windows: `%LOCALAPPDATA%\filings\facts.db`
#[must_use]
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filings")
        .join("facts.db")
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| FilingsError::InvalidParameter(format!("{key}={value}: {e}")))
}
