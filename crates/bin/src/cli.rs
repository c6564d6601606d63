use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "filings")]
#[command(about = "Extract SEC EDGAR XBRL metrics aligned to market days", long_about = None)]
#[command(version, propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Sets the level of tracing (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    pub(crate) trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Extract metric rows for a ticker
    Extract {
        /// Stock ticker
        ticker: String,

        /// Metric key to extract (repeatable); defaults to the curated list
        #[arg(short, long = "metric")]
        metrics: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Log every lookup, fact and row
        #[arg(long)]
        diagnostics: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// List the metric keys available for a ticker
    Concepts {
        /// Stock ticker
        ticker: String,

        /// Namespace to list
        #[arg(short, long, default_value = "us-gaap")]
        namespace: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Write a trend table for a ticker as CSV
    Trends {
        /// Stock ticker
        ticker: String,

        /// Table to build
        #[arg(long, value_enum, default_value_t = TrendTable::Revenue)]
        table: TrendTable,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the market open and next trading day for filing dates
    Align {
        /// Dates as YYYY-MM-DD
        #[arg(required = true)]
        dates: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TrendTable {
    /// Revenue rows with their percent change
    Growth,
    /// Revenue spread over days and totalled by month
    Revenue,
    /// Quarterly cost of goods from 10-Q filings
    Cogs,
}

impl TrendTable {
    pub(crate) const fn metric(self) -> &'static str {
        match self {
            Self::Growth | Self::Revenue => filings::REVENUE_METRIC,
            Self::Cogs => filings::COGS_METRIC,
        }
    }
}

/// Options controlling where company facts come from.
#[derive(Args, Debug, Default)]
pub(crate) struct SourceArgs {
    /// SEC User-Agent, e.g. "MyApp/1.0 (contact@example.com)" [env: SEC_USER_AGENT]
    #[arg(long)]
    pub(crate) user_agent: Option<String>,

    /// SQLite cache path [env: FILINGS_CACHE]
    #[arg(long, conflicts_with = "no_cache")]
    pub(crate) cache: Option<PathBuf>,

    /// Disable caching
    #[arg(long)]
    pub(crate) no_cache: bool,

    /// Ignore cached facts and fetch fresh data
    #[arg(long)]
    pub(crate) refresh: bool,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    /// Pretty-printed JSON rows
    Json,
    /// CSV table
    Csv,
    /// Row counts and latest value per metric
    Summary,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum TraceLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl TraceLevel {
    pub(crate) const fn as_filter(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
