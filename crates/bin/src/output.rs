//! Rendering of extraction results.

use chrono::{Datelike, NaiveDate};
use crate::cli::TrendTable;
use filings::{
    Extraction, ExtractedRow, MetricKey, monthly_revenue, next_trading_day, quarterly_cogs,
    rows_to_dataframe, rows_with_growth_rate, shift_to_market_open, split_by_metric,
};
use polars::prelude::*;
use std::error::Error;
use std::fmt::Write as _;
use std::io::Write;

pub(crate) fn write_json<W: Write>(writer: W, rows: &[ExtractedRow]) -> Result<(), Box<dyn Error>> {
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

pub(crate) fn write_csv<W: Write>(writer: W, rows: &[ExtractedRow]) -> Result<(), Box<dyn Error>> {
    write_frame_csv(writer, rows_to_dataframe(rows)?)
}

pub(crate) fn write_frame_csv<W: Write>(writer: W, mut df: DataFrame) -> Result<(), Box<dyn Error>> {
    CsvWriter::new(writer).finish(&mut df)?;
    Ok(())
}

/// Builds the frame for one trend table from extracted rows.
pub(crate) fn trend_frame(table: TrendTable, rows: &[ExtractedRow]) -> filings::Result<DataFrame> {
    let metric = table.metric();
    let group: Vec<ExtractedRow> = rows
        .iter()
        .filter(|row| row.content.as_str() == metric)
        .cloned()
        .collect();

    match table {
        TrendTable::Growth => rows_with_growth_rate(&group),
        TrendTable::Revenue => monthly_revenue(&group),
        TrendTable::Cogs => quarterly_cogs(&group),
    }
}

/// One line per requested metric with its row count and latest filing.
pub(crate) fn render_summary(extraction: &Extraction, metrics: &[MetricKey]) -> String {
    let width = metrics.iter().map(|m| m.as_str().len()).max().unwrap_or(0);
    let mut out = String::new();

    for (metric, group) in split_by_metric(&extraction.rows, metrics) {
        let _ = write!(out, "{:<width$}  {:>5} rows", metric.as_str(), group.len());
        if let Some(latest) = group.iter().max_by_key(|row| row.market_day) {
            let _ = write!(
                out,
                "  latest {}  {}  {}",
                latest.market_day.format("%Y-%m-%d %H:%M"),
                latest.fact.form.as_deref().unwrap_or("-"),
                latest.fact.val
            );
        }
        out.push('\n');
    }

    if !extraction.skipped.is_empty() {
        let _ = writeln!(
            out,
            "skipped {} facts without a usable filing date",
            extraction.skipped.len()
        );
    }

    out
}

pub(crate) fn render_alignment(date: NaiveDate) -> String {
    format!(
        "{date} ({})  market open {}  next trading day {}",
        date.weekday(),
        shift_to_market_open(date).format("%Y-%m-%d %H:%M"),
        next_trading_day(date)
    )
}
