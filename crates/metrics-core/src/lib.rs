//! Core domain types for the daily active users report.
//!
//! Holds the event and aggregate models, the error taxonomy, the report
//! configuration surface, and the Pacific-time calendar utilities shared by
//! the data and runtime crates.

pub mod config;
pub mod error;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{MetricsError, Result};
