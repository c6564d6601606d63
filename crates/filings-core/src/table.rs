//! Tabular views over extracted rows.

use chrono::{Datelike, Days, Months, NaiveDate};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};

use crate::error::{FilingsError, Result};
use crate::types::{ExtractedRow, MetricKey};

/// Converts rows into a polars [`DataFrame`].
///
/// Columns: `content`, `namespace`, `market_day` (millisecond datetime),
/// `filed`, `form`, `start`, `end`, `fy`, `fp`, `frame`, `accn`, `val` (null
/// for textual values) and `val_text` (null for numeric values).
///
/// # Errors
///
/// Returns [`FilingsError::Other`] if polars fails to assemble the frame.
pub fn rows_to_dataframe(rows: &[ExtractedRow]) -> Result<DataFrame> {
    let contents: Vec<&str> = rows.iter().map(|r| r.content.as_str()).collect();
    let namespaces: Vec<&str> = rows.iter().map(|r| r.namespace.as_str()).collect();
    let market_days: Vec<i64> = rows
        .iter()
        .map(|r| r.market_day.and_utc().timestamp_millis())
        .collect();
    let fiscal_years: Vec<Option<i32>> = rows.iter().map(|r| r.fact.fy).collect();
    let values: Vec<Option<f64>> = rows.iter().map(|r| r.fact.val.as_f64()).collect();
    let value_texts: Vec<Option<&str>> = rows.iter().map(|r| r.fact.val.as_text()).collect();

    let df = DataFrame::new(vec![
        Column::new("content".into(), contents),
        Column::new("namespace".into(), namespaces),
        Column::new("market_day".into(), market_days),
        Column::new("filed".into(), text_column(rows, |r| r.fact.filed.as_deref())),
        Column::new("form".into(), text_column(rows, |r| r.fact.form.as_deref())),
        Column::new("start".into(), text_column(rows, |r| r.fact.start.as_deref())),
        Column::new("end".into(), text_column(rows, |r| r.fact.end.as_deref())),
        Column::new("fy".into(), fiscal_years),
        Column::new("fp".into(), text_column(rows, |r| r.fact.fp.as_deref())),
        Column::new("frame".into(), text_column(rows, |r| r.fact.frame.as_deref())),
        Column::new("accn".into(), text_column(rows, |r| r.fact.accn.as_deref())),
        Column::new("val".into(), values),
        Column::new("val_text".into(), value_texts),
    ])
    .map_err(|e| FilingsError::Other(e.to_string()))?;

    df.lazy()
        .with_column(col("market_day").cast(DataType::Datetime(TimeUnit::Milliseconds, None)))
        .collect()
        .map_err(|e| FilingsError::Other(e.to_string()))
}

fn text_column<'a>(
    rows: &'a [ExtractedRow],
    f: fn(&ExtractedRow) -> Option<&str>,
) -> Vec<Option<&'a str>> {
    rows.iter().map(f).collect()
}

/// Groups rows by metric, one group per requested metric in request order.
///
/// Metrics without rows keep an empty group. Rows for metrics not requested
/// are dropped.
#[must_use]
pub fn split_by_metric<M: AsRef<str>>(
    rows: &[ExtractedRow],
    metrics: &[M],
) -> Vec<(MetricKey, Vec<ExtractedRow>)> {
    metrics
        .iter()
        .map(|metric| {
            let metric = metric.as_ref();
            let group = rows
                .iter()
                .filter(|row| row.content.as_str() == metric)
                .cloned()
                .collect();
            (MetricKey::new(metric), group)
        })
        .collect()
}

/// Percent change of each numeric value from the previous numeric value.
///
/// The first numeric value has no rate. Textual values have no rate and are
/// passed over, so the next number is compared with the last number seen.
#[must_use]
pub fn growth_rates(rows: &[ExtractedRow]) -> Vec<Option<f64>> {
    let mut previous: Option<f64> = None;
    rows.iter()
        .map(|row| {
            let current = row.fact.val.as_f64()?;
            let rate = previous.map(|prev| (current - prev) / prev * 100.0);
            previous = Some(current);
            rate
        })
        .collect()
}

/// [`rows_to_dataframe`] with an extra `growth_rate` column from [`growth_rates`].
///
/// # Errors
///
/// Returns [`FilingsError::Other`] if polars fails to assemble the frame.
pub fn rows_with_growth_rate(rows: &[ExtractedRow]) -> Result<DataFrame> {
    let mut df = rows_to_dataframe(rows)?;
    df.with_column(Column::new("growth_rate".into(), growth_rates(rows)))
        .map_err(|e| FilingsError::Other(e.to_string()))?;
    Ok(df)
}

/// Spreads duration values evenly over their days and totals them by month.
///
/// Each row with a numeric value and a `start..=end` period contributes
/// `val / days` to every day of the period. The result covers every month
/// from the earliest start to the latest end, with zero for months no period
/// touches.
///
/// Columns: `month` (date of the first day), `revenue` and
/// `cumulative_revenue`. Meant for the rows of one flow metric such as
/// [`REVENUE_METRIC`](crate::metrics::REVENUE_METRIC); instant facts are ignored.
///
/// # Errors
///
/// Returns [`FilingsError::Other`] if polars fails to assemble the frame.
pub fn monthly_revenue(rows: &[ExtractedRow]) -> Result<DataFrame> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut span: Option<(NaiveDate, NaiveDate)> = None;

    for row in rows {
        let (Some(value), Some(start), Some(end)) = (
            row.fact.val.as_f64(),
            row.fact.period_start(),
            row.fact.period_end(),
        ) else {
            continue;
        };
        if end < start {
            continue;
        }

        let daily = value / ((end - start).num_days() + 1) as f64;
        let mut month = first_of_month(start);
        while month <= end {
            let next = month + Months::new(1);
            let from = start.max(month);
            let to = end.min(next - Days::new(1));
            *totals.entry(month).or_insert(0.0) += daily * ((to - from).num_days() + 1) as f64;
            month = next;
        }

        let (first, last) = (first_of_month(start), first_of_month(end));
        span = Some(match span {
            Some((lo, hi)) => (lo.min(first), hi.max(last)),
            None => (first, last),
        });
    }

    let mut months = Vec::new();
    let mut revenue = Vec::new();
    let mut cumulative = Vec::new();
    if let Some((first, last)) = span {
        let mut total = 0.0;
        let mut month = first;
        while month <= last {
            let value = totals.get(&month).copied().unwrap_or(0.0);
            total += value;
            months.push(epoch_days(month));
            revenue.push(value);
            cumulative.push(total);
            month = month + Months::new(1);
        }
    }

    date_frame("month", vec![
        Column::new("month".into(), months),
        Column::new("revenue".into(), revenue),
        Column::new("cumulative_revenue".into(), cumulative),
    ])
}

/// Quarterly cost of goods from 10-Q facts.
///
/// Keeps `10-Q` rows with a numeric value and a parseable `end`, sorts them by
/// `end` and drops repeated `(end, val)` pairs, keeping the first.
///
/// Columns: `end` (date), `cogs` and `cogs_cumulative`. Meant for the rows of
/// [`COGS_METRIC`](crate::metrics::COGS_METRIC).
///
/// # Errors
///
/// Returns [`FilingsError::Other`] if polars fails to assemble the frame.
pub fn quarterly_cogs(rows: &[ExtractedRow]) -> Result<DataFrame> {
    let mut quarters: Vec<(NaiveDate, f64)> = rows
        .iter()
        .filter(|row| row.fact.form.as_deref() == Some("10-Q"))
        .filter_map(|row| Some((row.fact.period_end()?, row.fact.val.as_f64()?)))
        .collect();
    quarters.sort_by_key(|(end, _)| *end);

    let mut seen = HashSet::new();
    quarters.retain(|(end, val)| seen.insert((*end, val.to_bits())));

    let mut total = 0.0;
    let cumulative: Vec<f64> = quarters
        .iter()
        .map(|(_, val)| {
            total += val;
            total
        })
        .collect();

    date_frame("end", vec![
        Column::new(
            "end".into(),
            quarters.iter().map(|(end, _)| epoch_days(*end)).collect::<Vec<_>>(),
        ),
        Column::new(
            "cogs".into(),
            quarters.iter().map(|(_, val)| *val).collect::<Vec<_>>(),
        ),
        Column::new("cogs_cumulative".into(), cumulative),
    ])
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

// Days since 1970-01-01, the physical form of a polars `Date`.
fn epoch_days(date: NaiveDate) -> i32 {
    date.signed_duration_since(NaiveDate::default()).num_days() as i32
}

fn date_frame(date_col: &str, columns: Vec<Column>) -> Result<DataFrame> {
    DataFrame::new(columns)
        .map_err(|e| FilingsError::Other(e.to_string()))?
        .lazy()
        .with_column(col(date_col).cast(DataType::Date))
        .collect()
        .map_err(|e| FilingsError::Other(e.to_string()))
}
