use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the user-metrics pipeline.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// A configuration value failed validation before any computation ran.
    #[error("Invalid configuration for {parameter}: {message}")]
    InvalidConfig {
        parameter: &'static str,
        message: String,
    },

    /// The filtered event set was empty; downstream grouping is undefined.
    #[error("No events found between {start} and {end}")]
    EmptyInput {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A single event record could not be parsed.
    #[error("Malformed event {event_id}: {message}")]
    MalformedEvent { event_id: String, message: String },

    /// The event source could not be reached or read.
    #[error("Event source unavailable: {0}")]
    SourceUnavailable(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the metrics crates.
pub type Result<T> = std::result::Result<T, MetricsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_display_invalid_config() {
        let err = MetricsError::InvalidConfig {
            parameter: "window_days",
            message: "must be >= 1, got 0".to_string(),
        };
        let msg = err.to_string();
        assert_eq!(
            msg,
            "Invalid configuration for window_days: must be >= 1, got 0"
        );
    }

    #[test]
    fn test_error_display_empty_input() {
        let start = Utc.with_ymd_and_hms(2022, 3, 1, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 3, 15, 8, 0, 0).unwrap();
        let err = MetricsError::EmptyInput { start, end };
        let msg = err.to_string();
        assert!(msg.contains("No events found"));
        assert!(msg.contains("2022-03-01"));
        assert!(msg.contains("2022-03-15"));
    }

    #[test]
    fn test_error_display_malformed_event() {
        let err = MetricsError::MalformedEvent {
            event_id: "62a1f0c4e7".to_string(),
            message: "unparseable created_at".to_string(),
        };
        let msg = err.to_string();
        assert_eq!(msg, "Malformed event 62a1f0c4e7: unparseable created_at");
    }

    #[test]
    fn test_error_display_source_unavailable() {
        let err = MetricsError::SourceUnavailable("data path /missing not found".to_string());
        let msg = err.to_string();
        assert_eq!(msg, "Event source unavailable: data path /missing not found");
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = MetricsError::FileRead {
            path: PathBuf::from("/some/events.jsonl"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/events.jsonl"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_timestamp_parse() {
        let err = MetricsError::TimestampParse("not-a-timestamp".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid timestamp format: not-a-timestamp"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MetricsError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: MetricsError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
