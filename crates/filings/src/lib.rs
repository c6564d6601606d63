#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR XBRL metric extraction aligned to market days.
//!
//! This crate re-exports the core types, facts sources and caches, and
//! provides a [`MetricPipeline`] that fetches company facts with fallback and
//! caching, then extracts the requested metrics.
//!
//! # Features
//!
//! - `edgar` - SEC EDGAR company-facts source
//! - `cache-sqlite` - SQLite-based caching

// Core types and traits
pub use filings_core::*;

// Cache implementations
#[cfg(feature = "cache-sqlite")]
pub use filings_cache::SqliteCache;
pub use filings_cache::{InMemoryCache, NoopCache};

// Sources
#[cfg(feature = "edgar")]
pub use filings_edgar::{DEFAULT_NAMESPACES, EdgarClient, parse_company_facts};

mod config;
pub use config::{
    CACHE_TTL_VAR, CACHE_VAR, PipelineConfig, RATE_LIMIT_VAR, USER_AGENT_VAR, default_cache_path,
};

mod pipeline;
#[cfg(feature = "edgar")]
pub use pipeline::extract_metrics_from_edgar_xbrl;
pub use pipeline::MetricPipeline;
