//! # Collectors Module
//!
//! The gathering pipeline on top of a [`crate::client::TimeSeriesSource`].
//!
//! ## Architecture
//!
//! - **`HierarchyWalker`**: Traverses servers → metrics → samples, reduces every series and isolates failures per
//!   branch
//! - **`Orchestrator`**: Creates the Graphite client from the configuration, runs the walker and assembles the
//!   report
//!
//! ## Failure Handling
//!
//! - Server discovery failing aborts the run, there is nothing to report without the server set
//! - Metric discovery failing for one server drops that server from the report
//! - Fetching or reducing one metric failing drops that metric from its server
//!
//! Every dropped branch is logged as a warning and returned as a [`Diagnostic`].

pub mod orchestrator;
pub mod walker;

// Re-export the main types for easy access
pub use orchestrator::{
    Collection,
    Orchestrator,
};
pub use walker::{
    Diagnostic,
    HierarchyWalker,
    DIAGNOSTICS_TARGET,
    WalkOutcome,
    WalkSettings,
};
