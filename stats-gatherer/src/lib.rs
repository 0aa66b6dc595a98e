//! # Graphite Stats Gatherer
//!
//! Walks the server/metric tree of a Graphite store and reduces each metric's recent series to summary statistics.
//!
//! ## Features
//!
//! - **Discovery**: Servers below a root prefix, then the metrics of every server
//! - **Statistics**: Count, sum, average, minimum, maximum and standard deviation per metric, computed in one pass
//! - **Failure isolation**: A failing server or metric is reported and skipped, its siblings are still collected
//! - **Bounded parallelism**: Branches run concurrently up to a configurable number of in-flight requests, the report
//!   keeps discovery order
//! - **Output**: Indented JSON on stdout, optionally a terminal table and a JSON file
//!
//! ## Architecture
//!
//! - **`config`**: Layered configuration (built-in defaults, YAML file, command line)
//! - **`client`**: `TimeSeriesSource` trait and the Graphite HTTP client
//! - **`metrics`**: Paths, samples, statistics reduction and the report
//! - **`collectors`**: `HierarchyWalker` and the `Orchestrator` driving it
//!
//! ## Usage
//!
//! ```bash
//! # Statistics over the last week for every server below the default root prefix
//! GRAPHITE_URL=http://graphite:8080 graphite-stats-gatherer
//!
//! # Table output, one day of data, at most 8 requests at once
//! graphite-stats-gatherer --graphite-url=http://graphite:8080 \
//!                         --lookback=1d \
//!                         --max-concurrent-requests=8 \
//!                         --format=table
//! ```

#[macro_use]
extern crate tracing;

pub mod client;
pub mod collectors;
pub mod config;
pub mod error;
pub mod metrics;

#[cfg(test)]
mod testing;

pub use client::*;
pub use collectors::*;
pub use crate::config::{
    Config,
    ConfigOverrides,
};
pub use error::GatherError;
pub use metrics::*;
