//! # Graphite Stats Gatherer - Main Entry Point
//!
//! 1. Loads the configuration (defaults, optional YAML file, flags and environment)
//! 2. Discovers the servers and their metrics in Graphite
//! 3. Reduces every metric's series over the lookback window to summary statistics
//! 4. Prints the report as JSON (or a table) on stdout, diagnostics go to stderr

use clap::{
    Parser,
    ValueEnum,
};
use color_eyre::Result;
use graphite_stats_gatherer::{
    Config,
    ConfigOverrides,
    Orchestrator,
    DIAGNOSTICS_TARGET,
};
use std::path::PathBuf;
use tracing::{
    info,
    Level,
    Subscriber,
};
use tracing_subscriber::{
    filter::{
        filter_fn,
        FilterExt,
        Targets,
    },
    fmt::{
        self,
        MakeWriter,
    },
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Indented JSON
    #[default]
    Json,
    /// Terminal tables
    Table,
}

#[derive(Parser)]
#[command(name = "graphite-stats-gatherer")]
#[command(about = "Summary statistics for every metric of every server in a Graphite store")]
#[command(version)]
struct Cli {
    /// Graphite base URL (e.g., http://graphite:8080)
    #[arg(long, env = "GRAPHITE_URL")]
    graphite_url: Option<String>,

    /// Optional YAML file with any of the settings below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Graphite path whose children are the servers
    #[arg(long)]
    root_prefix: Option<String>,

    /// Path segment between a server and its metrics
    #[arg(long)]
    metrics_dir: Option<String>,

    /// Trailing window of samples per metric (e.g., "7d", "12h")
    #[arg(long)]
    lookback: Option<String>,

    /// Timeout of a single request (e.g., "30s")
    #[arg(long)]
    request_timeout: Option<String>,

    /// Maximum number of requests in flight, 1 walks the tree sequentially
    #[arg(long)]
    max_concurrent_requests: Option<u64>,

    /// Output format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Output file path (optional, if provided the JSON report is also written there)
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            graphite_url: self.graphite_url.clone(),
            root_prefix: self.root_prefix.clone(),
            metrics_dir: self.metrics_dir.clone(),
            lookback: self.lookback.clone(),
            request_timeout: self.request_timeout.clone(),
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }
}

/// Logs go to stderr, stdout only carries the report.
fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("graphite_stats_gatherer={log_level},warn")));

    subscriber(filter, std::io::stderr).init();
}

/// `filter` drives regular logging. Skipped-branch diagnostics get their own layer that always passes `warn`, so no
/// filter can hide them and none prints them twice.
fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
{
    let regular = filter.and(filter_fn(|metadata| metadata.target() != DIAGNOSTICS_TARGET));
    let diagnostics = Targets::new().with_target(DIAGNOSTICS_TARGET, Level::WARN);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer.clone()).with_filter(regular))
        .with(fmt::layer().with_writer(writer).with_filter(diagnostics))
        .with(tracing_error::ErrorLayer::default())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref(), cli.overrides())?;
    info!("Graphite URL: {}", config.graphite_url);
    info!("Root prefix: {}", config.root_prefix);
    info!("Lookback: {}", humantime::format_duration(config.lookback));

    let orchestrator = Orchestrator::new(config)?;
    let collection = orchestrator.collect().await?;

    let json_string = collection.report.to_json()?;
    match cli.format {
        OutputFormat::Json => println!("{json_string}"),
        OutputFormat::Table => println!("{}", collection.format()),
    }

    if let Some(output_file) = &cli.output_file {
        tokio::fs::write(output_file, &json_string).await?;
        info!("Report exported successfully to {}", output_file.display());
    }

    info!("Data collection completed successfully");
    Ok(())
}
