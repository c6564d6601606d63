#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR source for XBRL company facts.
//!
//! This crate provides access to SEC EDGAR company facts including:
//!
//! - CIK (Central Index Key) lookup from tickers
//! - Company facts from the EDGAR XBRL API
//! - Conversion of company facts into [`XbrlData`]
//!
//! # Example
//!
//! ```no_run
//! use filings_core::{FactsSource, Ticker, extract_metrics, TOP_METRICS};
//! use filings_edgar::EdgarClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EdgarClient::new("MyApp/1.0 (contact@example.com)");
//!
//!     let data = client.fetch_facts(&Ticker::new("PLTR")).await?;
//!     let rows = extract_metrics(&data, TOP_METRICS);
//!     println!("{} rows", rows.len());
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use filings_core::{FactsSource, FilingFact, FilingsError, MetricKey, Result, Ticker, XbrlData};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// SEC ticker/exchange table URL
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers_exchange.json";

/// Default rate limit: 10 requests per second (SEC requirement)
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Namespaces read from company facts, in output order.
pub const DEFAULT_NAMESPACES: &[&str] = &["dei", "invest", "us-gaap", "srt"];

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    const fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// SEC EDGAR company-facts client.
///
/// Resolves tickers to CIKs, downloads company facts and converts them into
/// [`XbrlData`]. Requests are serialized through a shared rate limiter, and
/// the ticker table is downloaded once per client.
#[derive(Debug)]
pub struct EdgarClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    namespaces: Vec<String>,
    tickers: OnceCell<HashMap<String, String>>,
}

impl EdgarClient {
    /// Create a new EDGAR client with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Example
    /// ```
    /// use filings_edgar::EdgarClient;
    ///
    /// let client = EdgarClient::new("MyApp/1.0 (contact@example.com)");
    /// ```
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self::with_client(client)
    }

    /// Create a new EDGAR client with a custom HTTP client.
    ///
    /// The client must already send an identifying user agent.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
            namespaces: DEFAULT_NAMESPACES.iter().map(|ns| ns.to_string()).collect(),
            tickers: OnceCell::new(),
        }
    }

    /// Sets the minimum interval between requests.
    #[must_use]
    pub fn with_rate_limit(mut self, min_interval: Duration) -> Self {
        self.rate_limiter = Arc::new(Mutex::new(RateLimiter::new(min_interval)));
        self
    }

    /// Sets which namespaces are read from company facts, in output order.
    #[must_use]
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    /// Namespaces read from company facts.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Look up a company's CIK number from its ticker.
    ///
    /// # Returns
    /// The company's CIK number as a zero-padded 10-digit string
    pub async fn get_cik(&self, ticker: &Ticker) -> Result<String> {
        if ticker.as_str().is_empty() {
            return Err(FilingsError::InvalidParameter("Empty ticker".to_string()));
        }

        let tickers = self
            .tickers
            .get_or_try_init(|| async {
                debug!("Fetching company tickers from SEC");
                let json = self.get_json(COMPANY_TICKERS_URL, None).await?;
                parse_company_tickers(&json)
            })
            .await?;

        let cik = tickers
            .get(ticker.as_str())
            .cloned()
            .ok_or_else(|| FilingsError::TickerNotFound(ticker.to_string()))?;

        debug!("Found CIK {} for ticker {}", cik, ticker);
        Ok(cik)
    }

    /// Fetch the raw company facts document for a CIK.
    ///
    /// # Arguments
    /// * `cik` - Company's CIK number (will be zero-padded)
    pub async fn fetch_company_facts_json(&self, cik: &str) -> Result<Value> {
        let subject = format!("CIK{}", pad_cik(cik));
        let url = format!("{}/api/xbrl/companyfacts/{}.json", EDGAR_BASE_URL, subject);

        self.get_json(&url, Some(&subject)).await
    }

    /// GET a JSON document. `subject` names what the document describes; a
    /// 404 for a subject is `DataNotAvailable`, any other failure is `Network`.
    async fn get_json(&self, url: &str, subject: Option<&str>) -> Result<Value> {
        // Rate limit
        self.rate_limiter.lock().await.wait().await;

        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FilingsError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(status_error(url, status, retry_after, subject));
        }

        response
            .json()
            .await
            .map_err(|e| FilingsError::Parse(format!("Failed to parse {}: {}", url, e)))
    }
}

fn status_error(
    url: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    subject: Option<&str>,
) -> FilingsError {
    match (status, subject) {
        (StatusCode::TOO_MANY_REQUESTS, _) => FilingsError::RateLimited {
            provider: "SEC EDGAR".to_string(),
            retry_after,
        },
        (StatusCode::NOT_FOUND, Some(subject)) => FilingsError::DataNotAvailable {
            ticker: subject.to_string(),
            reason: format!("HTTP 404 for {url}"),
        },
        _ => FilingsError::Network(format!("Failed to fetch {}: HTTP {}", url, status)),
    }
}

#[async_trait]
impl FactsSource for EdgarClient {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    fn description(&self) -> &str {
        "SEC EDGAR XBRL company facts (requires identifying User-Agent)"
    }

    async fn fetch_facts(&self, ticker: &Ticker) -> Result<XbrlData> {
        let cik = self.get_cik(ticker).await?;
        let json = self.fetch_company_facts_json(&cik).await.map_err(|e| match e {
            FilingsError::DataNotAvailable { reason, .. } => FilingsError::DataNotAvailable {
                ticker: ticker.to_string(),
                reason: format!("no company facts for CIK {cik} ({reason})"),
            },
            other => other,
        })?;

        let data = parse_company_facts(&json, &self.namespaces)?;
        if data.is_empty() {
            return Err(FilingsError::DataNotAvailable {
                ticker: ticker.to_string(),
                reason: format!("none of {:?} present in company facts", self.namespaces),
            });
        }

        debug!(
            ticker = %ticker,
            namespaces = data.len(),
            facts = data.fact_count(),
            "Parsed company facts"
        );
        Ok(data)
    }
}

/// Zero-pads a CIK to the 10 digits EDGAR URLs use.
pub fn pad_cik(cik: &str) -> String {
    format!("{:0>10}", cik.trim())
}

/// Parses the SEC `company_tickers_exchange.json` table into ticker → padded CIK.
///
/// The table has the shape `{"fields": ["cik", "name", "ticker", "exchange"], "data": [[...], ...]}`.
/// Tickers are uppercased. When a ticker is listed more than once the first row wins.
pub fn parse_company_tickers(json: &Value) -> Result<HashMap<String, String>> {
    let fields = json
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| FilingsError::Parse("Company tickers missing 'fields'".to_string()))?;

    let position = |name: &str| {
        fields
            .iter()
            .position(|f| f.as_str() == Some(name))
            .ok_or_else(|| FilingsError::Parse(format!("Company tickers missing '{name}' field")))
    };
    let cik_idx = position("cik")?;
    let ticker_idx = position("ticker")?;

    let rows = json
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| FilingsError::Parse("Company tickers missing 'data'".to_string()))?;

    let mut tickers = HashMap::with_capacity(rows.len());
    for row in rows.iter().filter_map(Value::as_array) {
        let ticker = row.get(ticker_idx).and_then(Value::as_str);
        let cik = row.get(cik_idx).and_then(|v| match v {
            Value::Number(n) => n.as_u64().map(|n| pad_cik(&n.to_string())),
            Value::String(s) => Some(pad_cik(s)),
            _ => None,
        });

        if let (Some(ticker), Some(cik)) = (ticker, cik) {
            tickers.entry(ticker.to_uppercase()).or_insert(cik);
        }
    }

    debug!("Loaded {} tickers", tickers.len());
    Ok(tickers)
}

/// Converts an EDGAR company facts document into [`XbrlData`].
///
/// Accepts the full API response (`{"cik", "entityName", "facts"}`) or just
/// its `facts` object. For each requested namespace present, every unit of
/// every concept becomes one metric key `{namespace}_{concept}_{unit}` holding
/// that unit's facts in document order. Concepts without `units` are skipped.
///
/// # Errors
///
/// Returns [`FilingsError::Parse`] if the facts are not an object,
/// [`FilingsError::MalformedNamespace`] if a namespace is not an object and
/// [`FilingsError::MalformedFactList`] if a unit does not hold a list of fact
/// objects.
pub fn parse_company_facts<S: AsRef<str>>(json: &Value, namespaces: &[S]) -> Result<XbrlData> {
    let facts = json.get("facts").unwrap_or(json);
    let facts = facts
        .as_object()
        .ok_or_else(|| FilingsError::Parse("Company facts must be an object".to_string()))?;

    let mut data = XbrlData::new();
    for namespace in namespaces {
        let namespace = namespace.as_ref();
        let Some(concepts) = facts.get(namespace) else {
            debug!(namespace, "No data found for namespace");
            continue;
        };

        let concepts = concepts
            .as_object()
            .ok_or_else(|| FilingsError::MalformedNamespace {
                namespace: namespace.to_string(),
                reason: "expected an object of concepts".to_string(),
            })?;

        let ns = data.namespace_mut(namespace);
        for (concept, details) in concepts {
            let Some(units) = details.get("units").and_then(Value::as_object) else {
                warn!(namespace, concept = %concept, "Concept does not have expected structure");
                continue;
            };

            for (unit, unit_facts) in units {
                let key = MetricKey::from_parts(namespace, concept, unit);
                let parsed = FilingFact::list_from_json(namespace, key.as_str(), unit_facts)?;
                ns.insert(key, parsed);
            }
        }
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn company_facts() -> Value {
        json!({
            "cik": 1321655,
            "entityName": "Palantir Technologies Inc.",
            "facts": {
                "us-gaap": {
                    "NetIncomeLoss": {
                        "label": "Net Income (Loss)",
                        "units": {
                            "USD": [
                                {"end": "2023-12-31", "val": 209825000, "accn": "0001321655-24-000022",
                                 "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2024-02-20",
                                 "frame": "CY2023", "start": "2023-01-01"}
                            ]
                        }
                    },
                    "EarningsPerShareBasic": {
                        "units": {
                            "USD/shares": [
                                {"end": "2023-12-31", "val": 0.1, "form": "10-K", "filed": "2024-02-20"}
                            ]
                        }
                    },
                    "Broken": {"label": "No units here"}
                },
                "dei": {
                    "EntityCommonStockSharesOutstanding": {
                        "units": {
                            "shares": [
                                {"end": "2024-02-12", "val": 2216660000u64, "form": "10-K", "filed": "2024-02-20"}
                            ]
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_parse_company_facts_keys() {
        let data = parse_company_facts(&company_facts(), DEFAULT_NAMESPACES).unwrap();

        // Output follows the requested namespace order.
        assert_eq!(data.namespace_names(), vec!["dei", "us-gaap"]);

        let concepts: Vec<_> = data
            .list_concepts("us-gaap")
            .into_iter()
            .map(MetricKey::as_str)
            .collect();
        assert_eq!(
            concepts,
            vec![
                "us-gaap_NetIncomeLoss_USD",
                "us-gaap_EarningsPerShareBasic_USD/shares"
            ]
        );

        let net_income = data
            .namespace("us-gaap")
            .and_then(|ns| ns.get("us-gaap_NetIncomeLoss_USD"))
            .unwrap();
        assert_eq!(net_income.len(), 1);
        assert_eq!(net_income[0].fy, Some(2023));
        assert_eq!(net_income[0].filed.as_deref(), Some("2024-02-20"));
    }

    #[test]
    fn test_parse_company_facts_accepts_bare_facts() {
        let full = company_facts();
        let bare = full["facts"].clone();
        let a = parse_company_facts(&full, &["us-gaap"]).unwrap();
        let b = parse_company_facts(&bare, &["us-gaap"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_company_facts_rejects_bad_unit_list() {
        let json = json!({"facts": {"us-gaap": {"Assets": {"units": {"USD": {"val": 1}}}}}});
        let err = parse_company_facts(&json, &["us-gaap"]).unwrap_err();
        match err {
            FilingsError::MalformedFactList { metric, .. } => {
                assert_eq!(metric, "us-gaap_Assets_USD");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_company_facts_rejects_bad_namespace() {
        let json = json!({"facts": {"dei": []}});
        let err = parse_company_facts(&json, &["dei"]).unwrap_err();
        assert!(matches!(err, FilingsError::MalformedNamespace { .. }));
    }

    #[test]
    fn test_parse_company_tickers() {
        let json = json!({
            "fields": ["cik", "name", "ticker", "exchange"],
            "data": [
                [1321655, "Palantir Technologies Inc.", "PLTR", "NYSE"],
                [320193, "Apple Inc.", "aapl", "Nasdaq"],
                [999, "Duplicate", "PLTR", "OTC"],
                ["bad row"]
            ]
        });

        let tickers = parse_company_tickers(&json).unwrap();
        assert_eq!(tickers.get("PLTR").map(String::as_str), Some("0001321655"));
        assert_eq!(tickers.get("AAPL").map(String::as_str), Some("0000320193"));
        assert_eq!(tickers.len(), 2);
    }

    #[test]
    fn test_parse_company_tickers_requires_fields() {
        let err = parse_company_tickers(&json!({"data": []})).unwrap_err();
        assert!(matches!(err, FilingsError::Parse(_)));
    }

    #[test]
    fn test_cik_padding() {
        assert_eq!(pad_cik("320193"), "0000320193");
        assert_eq!(pad_cik("0001321655"), "0001321655");
    }

    #[test]
    fn test_source_metadata() {
        let client = EdgarClient::new("Test/1.0 (test@example.com)")
            .with_rate_limit(Duration::from_millis(250))
            .with_namespaces(["us-gaap"]);

        assert_eq!(client.name(), "SEC EDGAR");
        assert!(!client.description().is_empty());
        assert_eq!(client.namespaces(), &["us-gaap".to_string()]);
    }

    #[test]
    fn test_status_error_for_ticker_table_is_network() {
        let err = status_error(COMPANY_TICKERS_URL, StatusCode::NOT_FOUND, None, None);
        match err {
            FilingsError::Network(msg) => {
                assert!(msg.contains("company_tickers_exchange.json"));
                assert!(msg.contains("404"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_error_for_company_facts() {
        let url = "https://data.sec.gov/api/xbrl/companyfacts/CIK0001321655.json";
        let err = status_error(url, StatusCode::NOT_FOUND, None, Some("CIK0001321655"));
        assert!(matches!(
            err,
            FilingsError::DataNotAvailable { ref ticker, .. } if ticker == "CIK0001321655"
        ));

        let err = status_error(url, StatusCode::INTERNAL_SERVER_ERROR, None, Some("CIK0001321655"));
        assert!(matches!(err, FilingsError::Network(_)));

        let err = status_error(
            url,
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(10)),
            None,
        );
        assert!(matches!(
            err,
            FilingsError::RateLimited { retry_after: Some(d), .. } if d == Duration::from_secs(10)
        ));
    }

    #[tokio::test]
    async fn test_get_cik_rejects_empty_ticker() {
        let client = EdgarClient::new("Test/1.0 (test@example.com)");
        let err = client.get_cik(&Ticker::new("")).await.unwrap_err();
        assert!(matches!(err, FilingsError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let mut limiter = RateLimiter::new(Duration::from_millis(20));
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
