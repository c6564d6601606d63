#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and logic for SEC XBRL company facts.
//!
//! This crate provides the foundational pieces for turning XBRL facts into
//! market-aligned records:
//!
//! - [`XbrlData`](types::XbrlData) - Namespace → metric → filing facts
//! - [`shift_to_market_open`](calendar::shift_to_market_open) - Filing date to market open
//! - [`extract_metrics`](extract::extract_metrics) - Flatten requested metrics into rows
//! - [`rows_to_dataframe`](table::rows_to_dataframe) - Rows to a polars `DataFrame`
//! - [`FactsSource`](source::FactsSource) - Upstream provider of XBRL facts
//! - [`FactsCache`](cache::FactsCache) - Caching abstraction

/// Cache trait for storing fetched facts.
pub mod cache;
/// Trading-calendar alignment of filing dates.
pub mod calendar;
/// Error types for filings operations.
pub mod error;
/// Metric extraction and diagnostics.
pub mod extract;
/// Curated metric lists.
pub mod metrics;
/// Source trait for fetching XBRL facts.
pub mod source;
/// Tabular views over extracted rows.
pub mod table;
/// Core data types (Ticker, MetricKey, FilingFact, XbrlData, ExtractedRow).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::FactsCache;
pub use calendar::{
    is_trading_day, market_open_time, next_trading_day, parse_filing_date, shift_to_market_open,
};
pub use error::{FilingsError, Result};
pub use extract::{
    Diagnostics, Extraction, MissingMetric, SkipReason, SkippedFact, extract_metrics,
    extract_metrics_with,
};
pub use metrics::{COGS_METRIC, REVENUE_METRIC, TOP_METRICS, top_metrics};
pub use source::FactsSource;
pub use table::{
    growth_rates, monthly_revenue, quarterly_cogs, rows_to_dataframe, rows_with_growth_rate,
    split_by_metric,
};
pub use types::{ExtractedRow, FactValue, FilingFact, MetricKey, Namespace, Ticker, XbrlData};
