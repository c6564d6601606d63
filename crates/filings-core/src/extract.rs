//! Metric extraction.
//!
//! Flattens the facts of the requested metrics into [`ExtractedRow`]s stamped
//! with the market open aligned to each filing date. Rows are produced in
//! metric order, then namespace order, then fact order.
//!
//! Facts without a usable `filed` date are skipped. Skips never abort an
//! extraction; they are logged and recorded in the returned [`Extraction`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, trace, warn};

use crate::calendar::{parse_filing_date, shift_to_market_open};
use crate::types::{ExtractedRow, MetricKey, XbrlData};

/// Which optional diagnostic events extraction emits.
///
/// Skipped facts are always logged at `warn`. These switches add `debug` and
/// `trace` events on top; all are off by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagnostics {
    /// Log each metric/namespace lookup.
    pub trace_lookups: bool,
    /// Log each fact as it is visited.
    pub trace_facts: bool,
    /// Log each emitted row.
    pub trace_rows: bool,
    /// Log metrics absent from a namespace.
    pub report_missing: bool,
}

impl Diagnostics {
    /// All diagnostics enabled.
    #[must_use]
    pub const fn verbose() -> Self {
        Self {
            trace_lookups: true,
            trace_facts: true,
            trace_rows: true,
            report_missing: true,
        }
    }
}

/// Why a fact produced no row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SkipReason {
    /// The fact has no `filed` key.
    MissingFiled,
    /// The `filed` value is not a `YYYY-MM-DD` date.
    UnparseableFiled(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFiled => f.write_str("missing 'filed'"),
            Self::UnparseableFiled(raw) => write!(f, "could not parse filing date '{raw}'"),
        }
    }
}

/// A fact that was skipped during extraction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFact {
    /// Namespace holding the fact.
    pub namespace: String,
    /// Metric the fact belongs to.
    pub metric: MetricKey,
    /// Position of the fact in its list.
    pub index: usize,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// A requested metric that a namespace does not contain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingMetric {
    /// The requested metric.
    pub metric: MetricKey,
    /// The namespace it was looked up in.
    pub namespace: String,
}

/// Result of an extraction: the rows plus what was left out.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Emitted rows in metric, namespace, fact order.
    pub rows: Vec<ExtractedRow>,
    /// Facts that produced no row.
    pub skipped: Vec<SkippedFact>,
    /// Metric/namespace pairs with no facts.
    pub missing: Vec<MissingMetric>,
}

impl Extraction {
    /// Requested metrics that produced no row in any namespace, in request order.
    #[must_use]
    pub fn metrics_without_rows<'a>(&self, metrics: &'a [MetricKey]) -> Vec<&'a MetricKey> {
        metrics
            .iter()
            .filter(|m| !self.rows.iter().any(|row| &row.content == *m))
            .collect()
    }
}

/// Extracts rows for the requested metrics with default diagnostics.
///
/// See [`extract_metrics_with`].
#[must_use]
pub fn extract_metrics<M: AsRef<str>>(data: &XbrlData, metrics: &[M]) -> Vec<ExtractedRow> {
    extract_metrics_with(data, metrics, &Diagnostics::default()).rows
}

/// Extracts rows for the requested metrics.
///
/// For each metric, in list order, every namespace containing it contributes
/// one row per fact with a parseable `filed` date. `market_day` is
/// [`shift_to_market_open`] of that date. The input is only read, so repeated
/// calls on the same data return identical results.
pub fn extract_metrics_with<M: AsRef<str>>(
    data: &XbrlData,
    metrics: &[M],
    diagnostics: &Diagnostics,
) -> Extraction {
    debug!(metrics = metrics.len(), namespaces = data.len(), "Processing metrics");

    let mut extraction = Extraction::default();

    for metric in metrics {
        let metric = metric.as_ref();
        for namespace in data.namespaces() {
            if diagnostics.trace_lookups {
                debug!(metric, namespace = namespace.name(), "Looking up metric");
            }

            let Some(facts) = namespace.get(metric) else {
                if diagnostics.report_missing {
                    debug!(metric, namespace = namespace.name(), "Metric not found in namespace");
                }
                extraction.missing.push(MissingMetric {
                    metric: MetricKey::new(metric),
                    namespace: namespace.name().to_string(),
                });
                continue;
            };

            let content = MetricKey::new(metric);
            for (index, fact) in facts.iter().enumerate() {
                if diagnostics.trace_facts {
                    trace!(metric, namespace = namespace.name(), index, ?fact, "Visiting fact");
                }

                let reason = match fact.filed.as_deref() {
                    None => SkipReason::MissingFiled,
                    Some(filed) => match parse_filing_date(filed) {
                        Some(filed_date) => {
                            let row = ExtractedRow::new(
                                fact,
                                shift_to_market_open(filed_date),
                                namespace.name(),
                                content.clone(),
                            );
                            if diagnostics.trace_rows {
                                trace!(?row, "Emitting row");
                            }
                            extraction.rows.push(row);
                            continue;
                        }
                        None => SkipReason::UnparseableFiled(filed.to_string()),
                    },
                };

                warn!(metric, namespace = namespace.name(), index, %reason, "Skipping fact");
                extraction.skipped.push(SkippedFact {
                    namespace: namespace.name().to_string(),
                    metric: content.clone(),
                    index,
                    reason,
                });
            }
        }
    }

    info!(
        rows = extraction.rows.len(),
        skipped = extraction.skipped.len(),
        "Total items collected"
    );

    extraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilingFact;
    use chrono::NaiveDate;

    fn sample() -> XbrlData {
        let mut data = XbrlData::new();
        data.insert(
            "dei",
            MetricKey::new("dei_EntityCommonStockSharesOutstanding_shares"),
            vec![FilingFact::new(2.0e9).with_filed("2024-02-20")],
        );
        data.insert(
            "us-gaap",
            MetricKey::new("us-gaap_NetIncomeLoss_USD"),
            vec![
                FilingFact::new(100.0).with_filed("2024-02-02").with_form("10-K"),
                FilingFact::new(50.0).with_form("10-Q"),
                FilingFact::new(75.0).with_filed("02/03/2024"),
                FilingFact::new(80.0).with_filed("2024-02-03"),
            ],
        );
        data.insert(
            "us-gaap",
            MetricKey::new("us-gaap_Assets_USD"),
            vec![FilingFact::new(1000.0).with_filed("2023-11-01")],
        );
        data
    }

    #[test]
    fn test_rows_follow_metric_order() {
        let data = sample();
        let rows = extract_metrics(&data, &["us-gaap_Assets_USD", "us-gaap_NetIncomeLoss_USD"]);

        let contents: Vec<_> = rows.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "us-gaap_Assets_USD",
                "us-gaap_NetIncomeLoss_USD",
                "us-gaap_NetIncomeLoss_USD"
            ]
        );
    }

    #[test]
    fn test_skips_are_reported() {
        let data = sample();
        let extraction =
            extract_metrics_with(&data, &["us-gaap_NetIncomeLoss_USD"], &Diagnostics::verbose());

        assert_eq!(extraction.rows.len(), 2);
        assert_eq!(extraction.skipped.len(), 2);
        assert_eq!(extraction.skipped[0].index, 1);
        assert_eq!(extraction.skipped[0].reason, SkipReason::MissingFiled);
        assert_eq!(
            extraction.skipped[1].reason,
            SkipReason::UnparseableFiled("02/03/2024".to_string())
        );
    }

    #[test]
    fn test_weekend_filing_moves_to_monday() {
        let data = sample();
        let rows = extract_metrics(&data, &["us-gaap_NetIncomeLoss_USD"]);
        let monday = NaiveDate::from_ymd_opt(2024, 2, 5)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(rows[1].market_day, monday);
        assert_eq!(rows[1].fact.val.as_f64(), Some(80.0));
    }

    #[test]
    fn test_missing_pairs_recorded() {
        let data = sample();
        let extraction = extract_metrics_with(
            &data,
            &["us-gaap_Assets_USD", "us-gaap_GrossProfit_USD"],
            &Diagnostics::default(),
        );

        // Assets is absent from dei; GrossProfit from both namespaces.
        assert_eq!(extraction.missing.len(), 3);
        assert_eq!(extraction.missing[0].namespace, "dei");

        let requested = vec![
            MetricKey::new("us-gaap_Assets_USD"),
            MetricKey::new("us-gaap_GrossProfit_USD"),
        ];
        let empty = extraction.metrics_without_rows(&requested);
        assert_eq!(empty, vec![&requested[1]]);
    }

    #[test]
    fn test_empty_inputs() {
        let rows = extract_metrics::<&str>(&sample(), &[]);
        assert!(rows.is_empty());

        let rows = extract_metrics(&XbrlData::new(), &["us-gaap_Assets_USD"]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::MissingFiled.to_string(), "missing 'filed'");
        assert_eq!(
            SkipReason::UnparseableFiled("x".into()).to_string(),
            "could not parse filing date 'x'"
        );
    }
}
