//! # Metrics Module
//!
//! Data model of a gathering run: Graphite paths, raw samples, the per-metric statistics reduction and the final
//! report.

pub mod path;
pub mod report;
pub mod series;
pub mod statistics;

// Re-export the main types for easy access
pub use path::*;
pub use report::*;
pub use series::*;
pub use statistics::*;
