//! Filings CLI binary.
//!
//! Fetches SEC EDGAR company facts and prints metric rows aligned to market days.

mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Commands, OutputFormat, SourceArgs, TraceLevel};
use filings::{
    Diagnostics, FilingsError, MetricKey, MetricPipeline, PipelineConfig, Ticker, XbrlData,
    parse_filing_date,
};
use std::io;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_tracing(level: Option<TraceLevel>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level.as_filter()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.trace);
    debug!("command line input recorded: {cli:?}");

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Extract {
            ticker,
            metrics,
            format,
            diagnostics,
            source,
        } => {
            let mut config = pipeline_config(&source)?;
            if !metrics.is_empty() {
                config.metrics = metrics.into_iter().map(MetricKey::from).collect();
            }
            if diagnostics {
                config.diagnostics = Diagnostics::verbose();
            }

            let pipeline = MetricPipeline::from_config(&config)?;
            let ticker = Ticker::new(ticker);
            let data = load_facts(&pipeline, &ticker, source.refresh).await?;
            let extraction = pipeline.extract_from(&data);

            match format {
                OutputFormat::Json => output::write_json(io::stdout().lock(), &extraction.rows)?,
                OutputFormat::Csv => output::write_csv(io::stdout().lock(), &extraction.rows)?,
                OutputFormat::Summary => {
                    print!("{}", output::render_summary(&extraction, pipeline.metrics()));
                }
            }
        }
        Commands::Concepts {
            ticker,
            namespace,
            source,
        } => {
            let config = pipeline_config(&source)?;
            let pipeline = MetricPipeline::from_config(&config)?;
            let ticker = Ticker::new(ticker);
            let data = load_facts(&pipeline, &ticker, source.refresh).await?;

            if data.namespace(&namespace).is_none() {
                return Err(Box::new(FilingsError::DataNotAvailable {
                    ticker: ticker.to_string(),
                    reason: format!(
                        "namespace '{}' not present; available: {}",
                        namespace,
                        data.namespace_names().join(", ")
                    ),
                }));
            }

            for key in data.list_concepts(&namespace) {
                println!("{key}");
            }
        }
        Commands::Trends {
            ticker,
            table,
            source,
        } => {
            let mut config = pipeline_config(&source)?;
            config.metrics = vec![MetricKey::new(table.metric())];

            let pipeline = MetricPipeline::from_config(&config)?;
            let ticker = Ticker::new(ticker);
            let data = load_facts(&pipeline, &ticker, source.refresh).await?;
            let rows = pipeline.extract_from(&data).rows;

            let df = output::trend_frame(table, &rows)?;
            output::write_frame_csv(io::stdout().lock(), df)?;
        }
        Commands::Align { dates } => {
            for date in dates {
                let parsed = parse_filing_date(&date).ok_or_else(|| {
                    FilingsError::InvalidParameter(format!("'{date}' is not a YYYY-MM-DD date"))
                })?;
                println!("{}", output::render_alignment(parsed));
            }
        }
    }

    Ok(())
}

async fn load_facts(
    pipeline: &MetricPipeline,
    ticker: &Ticker,
    refresh: bool,
) -> Result<XbrlData, FilingsError> {
    if refresh {
        pipeline.refresh_facts(ticker).await
    } else {
        pipeline.fetch_facts(ticker).await
    }
}

fn pipeline_config(source: &SourceArgs) -> Result<PipelineConfig, FilingsError> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(user_agent) = &source.user_agent {
        config.user_agent = Some(user_agent.clone());
    }
    if let Some(path) = &source.cache {
        config.cache_path = Some(path.clone());
    }
    if source.no_cache {
        config.cache_path = None;
    }
    Ok(config)
}
