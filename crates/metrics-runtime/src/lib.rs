//! Runtime layer for the daily active users report.
//!
//! Wraps the batch pipeline with a TTL cache plus retry, and drives periodic
//! recomputation for long-running consumers such as the watch-mode renderer.

pub mod refresher;
pub mod report_cache;

pub use metrics_core as core;
pub use metrics_data as data;
