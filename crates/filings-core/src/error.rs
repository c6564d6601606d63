//! Error types for filings operations.
//!
//! This module defines [`FilingsError`] which covers all error cases that can occur
//! when fetching, validating, caching or tabulating XBRL facts.

use thiserror::Error;

/// Errors that can occur during filings operations.
#[derive(Error, Debug)]
pub enum FilingsError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested ticker was not found.
    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    /// No facts are available for the requested ticker.
    #[error("Facts not available for {ticker}: {reason}")]
    DataNotAvailable {
        /// The ticker that was requested.
        ticker: String,
        /// Why nothing could be returned.
        reason: String,
    },

    /// A namespace entry is not a mapping of metric keys to fact lists.
    #[error("Malformed namespace '{namespace}': {reason}")]
    MalformedNamespace {
        /// The offending namespace.
        namespace: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A metric key does not map to a list of fact objects.
    #[error("Malformed fact list for {metric} in namespace '{namespace}': {reason}")]
    MalformedFactList {
        /// Namespace holding the metric.
        namespace: String,
        /// The offending metric key.
        metric: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// No source is configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested feature is not supported.
    #[error("Feature not supported: {0}")]
    NotSupported(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`FilingsError`].
pub type Result<T> = std::result::Result<T, FilingsError>;
