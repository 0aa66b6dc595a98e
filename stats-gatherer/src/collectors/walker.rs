use crate::{
    client::{
        SourceFuture,
        TimeSeriesSource,
    },
    error::{
        GatherError,
        Result,
    },
    metrics::{
        MetricPath,
        MetricStatistics,
        Report,
        Sample,
        ServerName,
        ServerStatistics,
    },
};
use futures::{
    stream,
    StreamExt,
};
use std::{
    fmt,
    time::Duration,
};
use tokio::sync::Semaphore;

/// Tracing target of skipped-branch diagnostics. The binary keeps it at `warn` whatever `RUST_LOG` says.
pub const DIAGNOSTICS_TARGET: &str = "graphite_stats_gatherer::diagnostics";

#[derive(Debug, Clone)]
pub struct WalkSettings {
    pub root_prefix: String,
    pub lookback: Duration,
    /// Upper bound of requests in flight across all branches. `1` walks the tree strictly sequentially.
    pub max_concurrent_requests: usize,
}

/// A recoverable failure of one branch. The branch is left out of the report, its siblings carry on.
#[derive(Debug)]
pub enum Diagnostic {
    /// Listing the metrics of a server failed, the server is skipped entirely.
    MetricDiscovery { server: ServerName, error: GatherError },
    /// Fetching or reducing one metric failed, only that metric is skipped.
    Metric {
        server: ServerName,
        metric: MetricPath,
        error: GatherError,
    },
}

impl Diagnostic {
    pub fn server(&self) -> &str {
        match self {
            Self::MetricDiscovery { server, .. } | Self::Metric { server, .. } => server,
        }
    }

    pub fn error(&self) -> &GatherError {
        match self {
            Self::MetricDiscovery { error, .. } | Self::Metric { error, .. } => error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetricDiscovery { server, error } => {
                write!(f, "skipping server {server}: failed to list metrics: {error}")
            }
            Self::Metric { server, metric, error } => {
                write!(f, "skipping metric {metric} of server {server}: {error}")
            }
        }
    }
}

/// Everything a walk produced: the surviving servers in discovery order and every failure on the way.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub servers: Vec<(ServerName, ServerStatistics)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl WalkOutcome {
    pub fn into_report(self) -> (Report, Vec<Diagnostic>) {
        (Report::assemble(self.servers), self.diagnostics)
    }
}

enum ServerBranch {
    Collected {
        server: ServerName,
        statistics: ServerStatistics,
        diagnostics: Vec<Diagnostic>,
    },
    Skipped(Diagnostic),
}

/// Walks servers → metrics → samples and reduces every series to [`MetricStatistics`].
///
/// Server and metric branches run through order-preserving buffered streams, so the outcome lists servers (and
/// inserts metrics) in discovery order no matter which request finishes first. A semaphore shared by all branches
/// bounds the number of requests hitting the store at once.
pub struct HierarchyWalker<S> {
    source: S,
    settings: WalkSettings,
    permits: Semaphore,
}

impl<S: TimeSeriesSource> HierarchyWalker<S> {
    pub fn new(source: S, settings: WalkSettings) -> Self {
        let permits = Semaphore::new(settings.max_concurrent_requests.max(1));
        Self {
            source,
            settings,
            permits,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn concurrency(&self) -> usize {
        self.settings.max_concurrent_requests.max(1)
    }

    /// Fails only if the server list itself cannot be fetched.
    pub async fn walk(&self) -> Result<WalkOutcome> {
        let servers = self
            .limited(self.source.list_servers(&self.settings.root_prefix))
            .await?;
        info!(
            servers = servers.len(),
            root_prefix = %self.settings.root_prefix,
            "discovered servers"
        );

        let branches: Vec<ServerBranch> = stream::iter(servers)
            .map(|server| self.walk_server(server))
            .buffered(self.concurrency())
            .collect()
            .await;

        let mut outcome = WalkOutcome::default();
        for branch in branches {
            match branch {
                ServerBranch::Collected {
                    server,
                    statistics,
                    diagnostics,
                } => {
                    outcome.servers.push((server, statistics));
                    outcome.diagnostics.extend(diagnostics);
                }
                ServerBranch::Skipped(diagnostic) => outcome.diagnostics.push(diagnostic),
            }
        }
        Ok(outcome)
    }

    async fn walk_server(&self, server: ServerName) -> ServerBranch {
        let metrics = match self
            .limited(self.source.list_metrics(&self.settings.root_prefix, &server))
            .await
        {
            Ok(metrics) => metrics,
            Err(error) => {
                let diagnostic = Diagnostic::MetricDiscovery { server, error };
                warn!(target: DIAGNOSTICS_TARGET, "{diagnostic}");
                return ServerBranch::Skipped(diagnostic);
            }
        };
        debug!(%server, metrics = metrics.len(), "discovered metrics");

        let results: Vec<(MetricPath, Result<MetricStatistics>)> = stream::iter(metrics)
            .map(|metric| async move {
                let result = self.walk_metric(&metric).await;
                (metric, result)
            })
            .buffered(self.concurrency())
            .collect()
            .await;

        let mut statistics = ServerStatistics::new();
        let mut diagnostics = Vec::new();
        for (metric, result) in results {
            match result {
                Ok(stats) => {
                    if statistics.insert(metric.last_segment().to_string(), stats).is_some() {
                        debug!(%server, %metric, "metric name reported twice, keeping the later path");
                    }
                }
                Err(error) => {
                    let diagnostic = Diagnostic::Metric {
                        server: server.clone(),
                        metric,
                        error,
                    };
                    warn!(target: DIAGNOSTICS_TARGET, "{diagnostic}");
                    diagnostics.push(diagnostic);
                }
            }
        }

        ServerBranch::Collected {
            server,
            statistics,
            diagnostics,
        }
    }

    async fn walk_metric(&self, metric: &MetricPath) -> Result<MetricStatistics> {
        let samples = self
            .limited(self.source.fetch_series(metric, self.settings.lookback))
            .await?;
        debug!(
            %metric,
            samples = samples.len(),
            first = ?samples.first().and_then(Sample::time),
            last = ?samples.last().and_then(Sample::time),
            "fetched series"
        );
        MetricStatistics::reduce(samples.iter().map(|sample| sample.value))
    }

    /// Runs one request while holding a permit.
    async fn limited<T>(&self, request: SourceFuture<'_, T>) -> Result<T> {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("request semaphore is never closed");
        request.await
    }
}
