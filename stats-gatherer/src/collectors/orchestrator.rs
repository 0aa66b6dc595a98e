use crate::{
    client::{
        GraphiteClient,
        TimeSeriesSource,
    },
    collectors::{
        Diagnostic,
        HierarchyWalker,
    },
    config::Config,
    error::Result,
    metrics::Report,
};
use chrono::{
    DateTime,
    Utc,
};
use std::time::{
    Duration,
    Instant,
};

/// Result of one gathering run
#[derive(Debug)]
pub struct Collection {
    pub report: Report,
    pub diagnostics: Vec<Diagnostic>,
    pub started_at: DateTime<Utc>,
    pub lookback: Duration,
    pub elapsed: Duration,
}

impl Collection {
    /// Human readable report for the terminal.
    pub fn format(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!("\n{}\n", "=".repeat(80)));
        report.push_str(&format!("{:^80}\n", "📈 GRAPHITE STATISTICS REPORT"));
        report.push_str(&format!("{}\n", "=".repeat(80)));

        report.push_str(&format!(
            "\n📊 Collection Summary:\n\
            • Collection Time: {}\n\
            • Lookback: {}\n\
            • Servers: {}\n\
            • Metrics: {}\n\
            • Skipped Branches: {}\n\
            • Elapsed: {:.1} seconds\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            humantime::format_duration(self.lookback),
            self.report.entries().len(),
            self.report.metric_count(),
            self.diagnostics.len(),
            self.elapsed.as_secs_f64(),
        ));

        report.push_str(&self.report.format_table());

        report.push_str(&format!("\n{}\n", "=".repeat(80)));
        report.push_str(&format!("{:^80}\n", "✅ END OF REPORT"));
        report.push_str(&format!("{}\n", "=".repeat(80)));

        report
    }
}

/// Wires the configuration to a client and a walker and turns a walk into a [`Collection`]
pub struct Orchestrator<S = GraphiteClient> {
    walker: HierarchyWalker<S>,
    lookback: Duration,
}

impl Orchestrator<GraphiteClient> {
    pub fn new(config: Config) -> Result<Self> {
        let client = GraphiteClient::new(
            config.graphite_url.clone(),
            config.metrics_dir.clone(),
            config.request_timeout,
        )?;
        Ok(Self::with_source(client, &config))
    }
}

impl<S: TimeSeriesSource> Orchestrator<S> {
    pub fn with_source(source: S, config: &Config) -> Self {
        Self {
            walker: HierarchyWalker::new(source, config.walk_settings()),
            lookback: config.lookback,
        }
    }

    /// Run the walk once. Only a failed server discovery is returned as an error.
    pub async fn collect(&self) -> Result<Collection> {
        let started_at = Utc::now();
        let started = Instant::now();
        let window_start = chrono::Duration::from_std(self.lookback)
            .ok()
            .and_then(|lookback| started_at.checked_sub_signed(lookback));
        info!(?window_start, "collecting statistics");

        let (report, diagnostics) = self.walker.walk().await?.into_report();
        let elapsed = started.elapsed();

        info!(
            servers = report.entries().len(),
            metrics = report.metric_count(),
            skipped = diagnostics.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "collection finished"
        );

        Ok(Collection {
            report,
            diagnostics,
            started_at,
            lookback: self.lookback,
            elapsed,
        })
    }
}
