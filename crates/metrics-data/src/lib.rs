//! Data layer for the daily active users report.
//!
//! Responsible for fetching log events from an event source, splitting them
//! into sessions with the inactivity-cooloff rule, aggregating session counts
//! per user per Pacific calendar date, and assembling the final report.

pub mod aggregator;
pub mod reader;
pub mod report;
pub mod sessions;
pub mod source;

pub use metrics_core as core;
