//! Core data types for XBRL company facts.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Ticker`] - Trading symbol used to look up a filer
//! - [`MetricKey`] - Namespace-qualified concept plus unit (`us-gaap_NetIncomeLoss_USD`)
//! - [`FactValue`] - Numeric or textual reported value
//! - [`FilingFact`] - One reported value for one metric in one filing
//! - [`Namespace`] / [`XbrlData`] - Validated namespace → metric → facts structure
//! - [`ExtractedRow`] - A filing fact stamped with its market day

use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::calendar::parse_filing_date;
use crate::error::{FilingsError, Result};

/// A trading symbol/ticker.
///
/// Tickers are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ticker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Identifier of a financial concept plus its unit, e.g. `us-gaap_NetIncomeLoss_USD`.
///
/// Keys are opaque and compared by exact string equality. Case is preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricKey(String);

impl MetricKey {
    /// Creates a metric key from its full string form.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Builds the key `{namespace}_{concept}_{unit}`.
    #[must_use]
    pub fn from_parts(namespace: &str, concept: &str, unit: &str) -> Self {
        Self(format!("{namespace}_{concept}_{unit}"))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MetricKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MetricKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MetricKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MetricKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A reported fact value.
///
/// XBRL values are numeric for almost every financial concept, but some
/// `dei` concepts carry text. Numbers keep their JSON representation, so an
/// integer is written back as the same integer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    /// Numeric value.
    Number(Number),
    /// Textual value.
    Text(String),
}

impl FactValue {
    /// Returns the numeric value as `f64`, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(_) => None,
        }
    }

    /// Returns the numeric value, if any.
    #[must_use]
    pub const fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(n) => Some(n),
            Self::Text(_) => None,
        }
    }

    /// Returns the textual value, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<Number> for FactValue {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FactValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for FactValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

/// Non-finite values have no JSON number form and become text.
impl From<f64> for FactValue {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or_else(|| Self::Text(n.to_string()), Self::Number)
    }
}

impl From<&str> for FactValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One reported value for one metric in one filing.
///
/// Dates are kept exactly as reported so that a malformed `filed` string can be
/// detected and skipped during extraction instead of rejecting the whole
/// dataset. Keys not modelled here are preserved in [`extra`](Self::extra).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilingFact {
    /// Reported value. Accepts `value` as an alternative key.
    #[serde(alias = "value")]
    pub val: FactValue,
    /// Start of the reporting period (absent for instant facts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// End of the reporting period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Accession number of the filing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accn: Option<String>,
    /// Fiscal year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<i32>,
    /// Fiscal period (`FY`, `Q1`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fp: Option<String>,
    /// Form type (`10-K`, `10-Q`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    /// Date the filing was submitted, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filed: Option<String>,
    /// Calendar frame (e.g. `CY2023Q4I`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    /// Any other keys present in the source fact.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FilingFact {
    /// Creates a fact holding only a value.
    #[must_use]
    pub fn new(val: impl Into<FactValue>) -> Self {
        Self {
            val: val.into(),
            start: None,
            end: None,
            accn: None,
            fy: None,
            fp: None,
            form: None,
            filed: None,
            frame: None,
            extra: Map::new(),
        }
    }

    /// Sets the filing date string.
    #[must_use]
    pub fn with_filed(mut self, filed: impl Into<String>) -> Self {
        self.filed = Some(filed.into());
        self
    }

    /// Sets the form type.
    #[must_use]
    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    /// Sets the reporting period bounds.
    #[must_use]
    pub fn with_period(mut self, start: Option<&str>, end: impl Into<String>) -> Self {
        self.start = start.map(str::to_string);
        self.end = Some(end.into());
        self
    }

    /// Sets fiscal year and period.
    #[must_use]
    pub fn with_fiscal(mut self, fy: i32, fp: impl Into<String>) -> Self {
        self.fy = Some(fy);
        self.fp = Some(fp.into());
        self
    }

    /// Parsed filing date, if present and well formed.
    #[must_use]
    pub fn filed_date(&self) -> Option<NaiveDate> {
        self.filed.as_deref().and_then(parse_filing_date)
    }

    /// Parsed period start, if present and well formed.
    #[must_use]
    pub fn period_start(&self) -> Option<NaiveDate> {
        self.start.as_deref().and_then(parse_filing_date)
    }

    /// Parsed period end, if present and well formed.
    #[must_use]
    pub fn period_end(&self) -> Option<NaiveDate> {
        self.end.as_deref().and_then(parse_filing_date)
    }

    /// Returns true for point-in-time facts such as balance sheet items.
    #[must_use]
    pub const fn is_instant(&self) -> bool {
        self.start.is_none()
    }

    /// Validates and converts a JSON list of fact objects.
    ///
    /// `namespace` and `metric` only label the error.
    ///
    /// # Errors
    ///
    /// Returns [`FilingsError::MalformedFactList`] if `value` is not a list,
    /// an item is not an object or an object has no value.
    pub fn list_from_json(namespace: &str, metric: &str, value: &Value) -> Result<Vec<Self>> {
        let malformed = |reason: String| FilingsError::MalformedFactList {
            namespace: namespace.to_string(),
            metric: metric.to_string(),
            reason,
        };

        let items = value.as_array().ok_or_else(|| {
            malformed(format!(
                "expected a list of facts, found {}",
                json_kind(value)
            ))
        })?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if !item.is_object() {
                    return Err(malformed(format!(
                        "fact #{i} is {}, not an object",
                        json_kind(item)
                    )));
                }
                Self::deserialize(item).map_err(|e| malformed(format!("fact #{i}: {e}")))
            })
            .collect()
    }

    /// Length of the reporting period in days for duration facts.
    #[must_use]
    pub fn duration_days(&self) -> Option<i64> {
        let start = self.period_start()?;
        let end = self.period_end()?;
        Some(end.signed_duration_since(start).num_days())
    }
}

/// Facts for one reporting taxonomy (`us-gaap`, `dei`, ...), keyed by [`MetricKey`].
///
/// Metric keys keep their insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Namespace {
    name: String,
    metrics: Vec<(MetricKey, Vec<FilingFact>)>,
    index: HashMap<MetricKey, usize>,
}

impl Namespace {
    /// Creates an empty namespace.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds facts under a metric key, appending if the key already exists.
    pub fn insert(&mut self, metric: MetricKey, facts: Vec<FilingFact>) {
        if let Some(existing) = self
            .index
            .get(&metric)
            .and_then(|&i| self.metrics.get_mut(i))
        {
            existing.1.extend(facts);
            return;
        }
        self.index.insert(metric.clone(), self.metrics.len());
        self.metrics.push((metric, facts));
    }

    /// Returns the facts for a metric key, if present.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<&[FilingFact]> {
        self.index
            .get(metric)
            .and_then(|&i| self.metrics.get(i))
            .map(|(_, facts)| facts.as_slice())
    }

    /// Returns true if the metric key is present.
    #[must_use]
    pub fn contains(&self, metric: &str) -> bool {
        self.index.contains_key(metric)
    }

    /// Iterates over metric keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &MetricKey> {
        self.metrics.iter().map(|(key, _)| key)
    }

    /// Iterates over `(metric, facts)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&MetricKey, &[FilingFact])> {
        self.metrics
            .iter()
            .map(|(key, facts)| (key, facts.as_slice()))
    }

    /// Number of metric keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Returns true if there are no metric keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Total number of facts across all metric keys.
    #[must_use]
    pub fn fact_count(&self) -> usize {
        self.metrics.iter().map(|(_, facts)| facts.len()).sum()
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.metrics.len()))?;
        for (key, facts) in &self.metrics {
            map.serialize_entry(key, facts)?;
        }
        map.end()
    }
}

/// Parsed XBRL company facts: namespace → metric key → ordered filing facts.
///
/// Built once per ticker at the parser boundary ([`XbrlData::from_json`]) and
/// only read afterwards. Namespaces keep their insertion order, which fixes
/// the order rows are produced in during extraction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XbrlData {
    namespaces: Vec<Namespace>,
}

impl XbrlData {
    /// Creates an empty structure.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            namespaces: Vec::new(),
        }
    }

    /// Returns the namespace with the given name, creating it if missing.
    pub fn namespace_mut(&mut self, name: &str) -> &mut Namespace {
        let pos = match self.namespaces.iter().position(|ns| ns.name == name) {
            Some(pos) => pos,
            None => {
                self.namespaces.push(Namespace::new(name));
                self.namespaces.len() - 1
            }
        };
        &mut self.namespaces[pos]
    }

    /// Adds facts for a metric under a namespace.
    pub fn insert(&mut self, namespace: &str, metric: MetricKey, facts: Vec<FilingFact>) {
        self.namespace_mut(namespace).insert(metric, facts);
    }

    /// Looks up a namespace by name.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    /// Iterates over namespaces in insertion order.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.iter()
    }

    /// Namespace names in insertion order.
    #[must_use]
    pub fn namespace_names(&self) -> Vec<&str> {
        self.namespaces.iter().map(|ns| ns.name()).collect()
    }

    /// Metric keys available in a namespace, in insertion order.
    ///
    /// Returns an empty list for unknown namespaces.
    #[must_use]
    pub fn list_concepts(&self, namespace: &str) -> Vec<&MetricKey> {
        self.namespace(namespace)
            .map(|ns| ns.keys().collect())
            .unwrap_or_default()
    }

    /// Number of namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Returns true if there are no namespaces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Total number of facts across all namespaces.
    #[must_use]
    pub fn fact_count(&self) -> usize {
        self.namespaces.iter().map(Namespace::fact_count).sum()
    }

    /// Validates and converts `{namespace: {metric_key: [fact, ...]}}` JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FilingsError::Parse`] if the root is not an object,
    /// [`FilingsError::MalformedNamespace`] if a namespace is not an object and
    /// [`FilingsError::MalformedFactList`] if a metric does not hold a list of
    /// fact objects.
    pub fn from_json(value: &Value) -> Result<Self> {
        let root = value.as_object().ok_or_else(|| {
            FilingsError::Parse(format!(
                "expected an object of namespaces, found {}",
                json_kind(value)
            ))
        })?;

        let mut data = Self::new();
        for (namespace, metrics) in root {
            let metrics = metrics
                .as_object()
                .ok_or_else(|| FilingsError::MalformedNamespace {
                    namespace: namespace.clone(),
                    reason: format!("expected an object of metric keys, found {}", json_kind(metrics)),
                })?;

            let ns = data.namespace_mut(namespace);
            for (metric, facts) in metrics {
                let facts = FilingFact::list_from_json(namespace, metric, facts)?;
                ns.insert(MetricKey::new(metric.as_str()), facts);
            }
        }

        Ok(data)
    }

    /// Parses and validates a JSON string. See [`XbrlData::from_json`].
    ///
    /// # Errors
    ///
    /// Returns [`FilingsError::Parse`] for invalid JSON, otherwise as
    /// [`XbrlData::from_json`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| FilingsError::Parse(format!("Invalid XBRL JSON: {}", e)))?;
        Self::from_json(&value)
    }
}

impl Serialize for XbrlData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.namespaces.len()))?;
        for ns in &self.namespaces {
            map.serialize_entry(ns.name(), ns)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for XbrlData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// A filing fact stamped with the market day its information became available.
///
/// Serializes flat: every fact field plus `market_day`, `namespace` and `content`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Copy of the source fact.
    #[serde(flatten)]
    pub fact: FilingFact,
    /// Market open aligned with the filing date.
    pub market_day: NaiveDateTime,
    /// Namespace the fact was found in.
    pub namespace: String,
    /// The requested metric key.
    pub content: MetricKey,
}

impl ExtractedRow {
    /// Creates a row from a fact and its alignment.
    #[must_use]
    pub fn new(
        fact: &FilingFact,
        market_day: NaiveDateTime,
        namespace: impl Into<String>,
        content: MetricKey,
    ) -> Self {
        Self {
            fact: fact.clone(),
            market_day,
            namespace: namespace.into(),
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ticker_creation() {
        let ticker = Ticker::new("pltr");
        assert_eq!(ticker.as_str(), "PLTR");
        assert_eq!(Ticker::from("aapl").to_string(), "AAPL");
    }

    #[test]
    fn test_metric_key_from_parts() {
        let key = MetricKey::from_parts("us-gaap", "EarningsPerShareBasic", "USD/shares");
        assert_eq!(key.as_str(), "us-gaap_EarningsPerShareBasic_USD/shares");
    }

    #[test]
    fn test_fact_accepts_value_alias_and_keeps_extra_fields() {
        let fact: FilingFact = serde_json::from_value(json!({
            "value": 42,
            "end": "2023-12-31",
            "form": "10-K",
            "filed": "2024-02-20",
            "custom": "kept"
        }))
        .unwrap();

        assert_eq!(fact.val, FactValue::from(42_u64));
        assert_eq!(fact.val.as_f64(), Some(42.0));
        assert_eq!(fact.form.as_deref(), Some("10-K"));
        assert_eq!(fact.extra.get("custom"), Some(&json!("kept")));
        assert!(fact.is_instant());
    }

    #[test]
    fn test_fact_text_value() {
        let fact: FilingFact =
            serde_json::from_value(json!({"val": "Palantir", "end": "2023-12-31"})).unwrap();
        assert_eq!(fact.val.as_text(), Some("Palantir"));
        assert_eq!(fact.val.as_f64(), None);
    }

    #[test]
    fn test_fact_value_keeps_integer_representation() {
        let fact: FilingFact =
            serde_json::from_value(json!({"val": 9007199254740993_u64, "filed": "2024-02-02"}))
                .unwrap();
        let written = serde_json::to_value(&fact).unwrap();
        assert_eq!(written["val"], json!(9007199254740993_u64));
        assert_eq!(serde_json::to_string(&FactValue::from(209825000_i64)).unwrap(), "209825000");
        assert_eq!(serde_json::to_string(&FactValue::from(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn test_non_finite_value_becomes_text() {
        assert_eq!(FactValue::from(f64::NAN).as_text(), Some("NaN"));
    }

    #[test]
    fn test_fact_duration() {
        let fact = FilingFact::new(1.0).with_period(Some("2023-01-01"), "2023-12-31");
        assert!(!fact.is_instant());
        assert_eq!(fact.duration_days(), Some(364));
    }

    #[test]
    fn test_xbrl_data_preserves_namespace_order() {
        let data = XbrlData::from_json(&json!({
            "us-gaap": {"us-gaap_Assets_USD": []},
            "dei": {"dei_EntityCommonStockSharesOutstanding_shares": []}
        }))
        .unwrap();

        assert_eq!(data.namespace_names(), vec!["us-gaap", "dei"]);
    }

    #[test]
    fn test_xbrl_data_rejects_non_list_metric() {
        let err = XbrlData::from_json(&json!({
            "us-gaap": {"us-gaap_Assets_USD": {"val": 1}}
        }))
        .unwrap_err();

        match err {
            FilingsError::MalformedFactList {
                namespace, metric, ..
            } => {
                assert_eq!(namespace, "us-gaap");
                assert_eq!(metric, "us-gaap_Assets_USD");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_xbrl_data_rejects_non_object_fact() {
        let err = XbrlData::from_json(&json!({
            "us-gaap": {"us-gaap_Assets_USD": [1, 2]}
        }))
        .unwrap_err();
        assert!(matches!(err, FilingsError::MalformedFactList { .. }));
    }

    #[test]
    fn test_xbrl_data_rejects_non_object_namespace() {
        let err = XbrlData::from_json(&json!({"us-gaap": ["x"]})).unwrap_err();
        assert!(matches!(err, FilingsError::MalformedNamespace { .. }));
    }

    #[test]
    fn test_xbrl_data_serde_round_trip() {
        let mut data = XbrlData::new();
        data.insert(
            "us-gaap",
            MetricKey::new("us-gaap_NetIncomeLoss_USD"),
            vec![FilingFact::new(100.0).with_filed("2024-02-02")],
        );

        let json = serde_json::to_string(&data).unwrap();
        let back: XbrlData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_namespace_insert_appends() {
        let mut ns = Namespace::new("us-gaap");
        let key = MetricKey::new("us-gaap_Assets_USD");
        ns.insert(key.clone(), vec![FilingFact::new(1.0)]);
        ns.insert(key, vec![FilingFact::new(2.0)]);

        assert_eq!(ns.len(), 1);
        assert_eq!(ns.get("us-gaap_Assets_USD").map(<[_]>::len), Some(2));
        assert_eq!(ns.fact_count(), 2);
    }
}
