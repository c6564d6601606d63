//! Source trait for fetching XBRL company facts.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{Ticker, XbrlData},
};

/// Upstream provider of parsed XBRL company facts.
///
/// Implementations resolve a ticker to a filer, download its company facts
/// and return them as validated [`XbrlData`].
#[async_trait]
pub trait FactsSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Returns a description of this source.
    fn description(&self) -> &str;

    /// Fetches all company facts for a ticker.
    async fn fetch_facts(&self, ticker: &Ticker) -> Result<XbrlData>;
}
