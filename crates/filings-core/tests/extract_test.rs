//! Integration tests for metric extraction

use chrono::NaiveDate;
use filings_core::{
    Diagnostics, FactValue, FilingsError, SkipReason, XbrlData, extract_metrics,
    extract_metrics_with, rows_to_dataframe, split_by_metric,
};
use serde_json::json;

const NET_INCOME: &str = "us-gaap_NetIncomeLoss_USD";

fn single_fact(filed: &str) -> XbrlData {
    XbrlData::from_json(&json!({
        "us-gaap": {
            NET_INCOME: [{"val": 100, "filed": filed, "form": "10-K"}]
        }
    }))
    .unwrap()
}

fn open_on(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

#[test]
fn test_weekday_filing_single_row() {
    let rows = extract_metrics(&single_fact("2024-02-02"), &[NET_INCOME]);

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.market_day, open_on(2024, 2, 2));
    assert_eq!(row.content.as_str(), NET_INCOME);
    assert_eq!(row.namespace, "us-gaap");
    assert_eq!(row.fact.val, FactValue::from(100_u64));
    assert_eq!(row.fact.form.as_deref(), Some("10-K"));
    assert_eq!(row.fact.filed.as_deref(), Some("2024-02-02"));
}

#[test]
fn test_saturday_filing_moves_to_monday() {
    let rows = extract_metrics(&single_fact("2024-02-03"), &[NET_INCOME]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].market_day, open_on(2024, 2, 5));
}

#[test]
fn test_unparseable_filing_date_yields_no_rows() {
    let data = single_fact("not-a-date");
    let extraction = extract_metrics_with(&data, &[NET_INCOME], &Diagnostics::default());

    assert!(extraction.rows.is_empty());
    assert_eq!(extraction.skipped.len(), 1);
    assert_eq!(
        extraction.skipped[0].reason,
        SkipReason::UnparseableFiled("not-a-date".to_string())
    );
}

#[test]
fn test_padded_filing_dates_are_skipped() {
    for filed in [" 2024-02-02", "2024-02-02\n", "2024-02-02 "] {
        let extraction =
            extract_metrics_with(&single_fact(filed), &[NET_INCOME], &Diagnostics::default());

        assert!(extraction.rows.is_empty(), "{filed:?} produced a row");
        assert_eq!(
            extraction.skipped[0].reason,
            SkipReason::UnparseableFiled(filed.to_string())
        );
    }
}

#[test]
fn test_missing_filed_yields_no_rows() {
    let data = XbrlData::from_json(&json!({
        "us-gaap": {NET_INCOME: [{"val": 100, "end": "2023-12-31", "form": "10-K"}]}
    }))
    .unwrap();

    let extraction = extract_metrics_with(&data, &[NET_INCOME], &Diagnostics::verbose());
    assert!(extraction.rows.is_empty());
    assert_eq!(extraction.skipped[0].reason, SkipReason::MissingFiled);
}

#[test]
fn test_one_row_per_metric_namespace_fact() {
    let data = XbrlData::from_json(&json!({
        "us-gaap": {
            "us-gaap_Assets_USD": [
                {"val": 10, "end": "2023-09-30", "filed": "2023-11-02", "form": "10-Q"},
                {"val": 12, "end": "2023-12-31", "filed": "2024-02-20", "form": "10-K"}
            ],
            NET_INCOME: [
                {"val": 1, "filed": "2023-11-02", "form": "10-Q"},
                {"val": 2, "form": "10-Q"}
            ]
        },
        "srt": {
            "us-gaap_Assets_USD": [
                {"val": 11, "filed": "2023-11-04", "form": "10-Q"}
            ]
        }
    }))
    .unwrap();

    let metrics = ["us-gaap_Assets_USD", NET_INCOME, "us-gaap_GrossProfit_USD"];
    let rows = extract_metrics(&data, &metrics);

    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.content.as_str(), r.namespace.as_str(), r.fact.val.as_f64()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("us-gaap_Assets_USD", "us-gaap", Some(10.0)),
            ("us-gaap_Assets_USD", "us-gaap", Some(12.0)),
            ("us-gaap_Assets_USD", "srt", Some(11.0)),
            (NET_INCOME, "us-gaap", Some(1.0)),
        ]
    );

    // Every row carries a requested key.
    assert!(rows.iter().all(|r| metrics.contains(&r.content.as_str())));

    let groups = split_by_metric(&rows, &metrics);
    let sizes: Vec<_> = groups.iter().map(|(_, g)| g.len()).collect();
    assert_eq!(sizes, vec![3, 1, 0]);

    let df = rows_to_dataframe(&rows).unwrap();
    assert_eq!(df.height(), rows.len());
}

#[test]
fn test_extraction_is_idempotent() {
    let data = single_fact("2024-02-03");
    let first = extract_metrics_with(&data, &[NET_INCOME], &Diagnostics::verbose());
    let second = extract_metrics_with(&data, &[NET_INCOME], &Diagnostics::verbose());
    assert_eq!(first, second);
}

#[test]
fn test_row_serializes_flat() {
    let mut data = single_fact("2024-02-02");
    data.insert(
        "us-gaap",
        NET_INCOME.into(),
        vec![serde_json::from_value(json!({"val": 5, "filed": "2024-02-02", "custom": true})).unwrap()],
    );

    let rows = extract_metrics(&data, &[NET_INCOME]);
    let value = serde_json::to_value(&rows[1]).unwrap();

    assert_eq!(value["content"], json!(NET_INCOME));
    assert_eq!(value["namespace"], json!("us-gaap"));
    assert_eq!(value["market_day"], json!("2024-02-02T09:30:00"));
    assert_eq!(value["val"], json!(5));
    assert_eq!(value["custom"], json!(true));
}

#[test]
fn test_large_integer_value_survives_extraction() {
    let data = XbrlData::from_json(&json!({
        "us-gaap": {NET_INCOME: [
            {"val": 209825000, "filed": "2024-02-02"},
            {"val": 9007199254740993_u64, "filed": "2024-02-02"}
        ]}
    }))
    .unwrap();

    let rows = extract_metrics(&data, &[NET_INCOME]);
    let json = serde_json::to_string(&rows).unwrap();

    assert!(json.contains(r#""val":209825000,"#));
    assert!(json.contains(r#""val":9007199254740993,"#));
}

#[test]
fn test_malformed_fact_list_rejected_at_parse() {
    let err = XbrlData::from_json(&json!({
        "us-gaap": {NET_INCOME: "oops"}
    }))
    .unwrap_err();
    assert!(matches!(err, FilingsError::MalformedFactList { .. }));

    let err = XbrlData::from_json(&json!({
        "us-gaap": {NET_INCOME: [{"filed": "2024-02-02"}]}
    }))
    .unwrap_err();
    assert!(matches!(err, FilingsError::MalformedFactList { .. }));
}
