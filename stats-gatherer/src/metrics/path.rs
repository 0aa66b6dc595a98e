use std::fmt;

/// Display name of a server, the last segment of its discovery path.
pub type ServerName = String;

/// Output key of a metric, the last segment of its [`MetricPath`].
pub type MetricName = String;

/// A dotted Graphite path such as `telegraf.vsphere_metrics.host-01.snmp.cpu`.
///
/// Distinct paths can share the same [`MetricPath::last_segment`]. Whoever keys results by that segment has to decide
/// what a collision means; see [`crate::metrics::ServerStatistics`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricPath(String);

impl MetricPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The label after the last dot, or the whole path if it has no dots.
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for MetricPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetricPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for MetricPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}
