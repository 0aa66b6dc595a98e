//! # Client Module
//!
//! Access to the remote time-series store.
//!
//! - **`TimeSeriesSource`**: the three queries the walker needs (server discovery, metric discovery, range query)
//! - **`GraphiteClient`**: `TimeSeriesSource` over the Graphite HTTP/JSON API
//!
//! No call is retried. A failed request is returned to the caller as is.

pub mod graphite;

pub use graphite::GraphiteClient;

use crate::{
    error::Result,
    metrics::{
        MetricPath,
        Sample,
        ServerName,
    },
};
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The queries a [`crate::collectors::HierarchyWalker`] issues against a store
pub trait TimeSeriesSource: Send + Sync {
    /// Discover the servers below `root_prefix`, in the order the store returns them.
    fn list_servers<'a>(&'a self, root_prefix: &'a str) -> SourceFuture<'a, Vec<ServerName>>;

    /// Discover the fully qualified metric paths of one server.
    fn list_metrics<'a>(&'a self, root_prefix: &'a str, server: &'a str) -> SourceFuture<'a, Vec<MetricPath>>;

    /// Fetch the samples of one metric over the trailing `lookback` window.
    fn fetch_series<'a>(&'a self, metric: &'a MetricPath, lookback: Duration) -> SourceFuture<'a, Vec<Sample>>;
}
