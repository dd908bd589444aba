//! JSONL-backed event source.
//!
//! Reads log-event records exported from the backend's document store as
//! newline-delimited JSON, one record per line, and serves them through the
//! [`EventSource`] interface.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use metrics_core::models::LogEvent;
use metrics_core::time_utils;
use metrics_core::{MetricsError, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::source::{EventBatch, EventSource, MalformedRecord};

// ── File discovery ────────────────────────────────────────────────────────────

/// Find all `.jsonl` files recursively under `data_path`, sorted by path.
pub fn find_jsonl_files(data_path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "jsonl")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

// ── JsonlEventSource ──────────────────────────────────────────────────────────

/// Event source over a directory of exported `.jsonl` files.
///
/// Records may use either plain keys (`event_id`, `created_at` as an ISO
/// string) or the document store's export shape (`_id` as `{"$oid": ...}`,
/// `created_at` as `{"$date": ...}`). Records that cannot be parsed are
/// collected as [`MalformedRecord`]s rather than aborting the batch.
pub struct JsonlEventSource {
    data_path: PathBuf,
}

impl JsonlEventSource {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
        }
    }

    /// Parse one JSONL line into a [`LogEvent`].
    ///
    /// Returns `Err` with the record's id (when recoverable) and the reason
    /// the record was rejected.
    fn parse_record(value: &Value) -> std::result::Result<LogEvent, MalformedRecord> {
        let event_id = extract_id(value, &["_id", "event_id"]).ok_or_else(|| MalformedRecord {
            event_id: "<unknown>".to_string(),
            reason: "missing _id/event_id".to_string(),
        })?;

        let user_id = extract_id(value, &["user_id"]).ok_or_else(|| MalformedRecord {
            event_id: event_id.clone(),
            reason: "missing user_id".to_string(),
        })?;

        let created_at = value
            .get("created_at")
            .and_then(extract_timestamp)
            .ok_or_else(|| MalformedRecord {
                event_id: event_id.clone(),
                reason: "unparseable created_at".to_string(),
            })?;

        let event_type = value
            .get("event_type")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(LogEvent {
            event_id,
            user_id,
            event_type,
            created_at,
        })
    }
}

impl EventSource for JsonlEventSource {
    fn fetch_events(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<EventBatch> {
        if !self.data_path.exists() {
            return Err(MetricsError::SourceUnavailable(format!(
                "data path {} not found",
                self.data_path.display()
            )));
        }

        let jsonl_files = find_jsonl_files(&self.data_path);
        if jsonl_files.is_empty() {
            warn!("No JSONL files found in {}", self.data_path.display());
            return Ok(EventBatch::default());
        }

        let mut batch = EventBatch::default();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for file_path in &jsonl_files {
            let file = std::fs::File::open(file_path).map_err(|source| MetricsError::FileRead {
                path: file_path.clone(),
                source,
            })?;
            let reader = std::io::BufReader::new(file);

            for line in reader.lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("Unreadable line in {}: {}", file_path.display(), e);
                        continue;
                    }
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let value: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        batch.malformed.push(MalformedRecord {
                            event_id: "<unknown>".to_string(),
                            reason: format!("invalid JSON: {}", e),
                        });
                        continue;
                    }
                };

                match Self::parse_record(&value) {
                    Ok(event) => {
                        // Strictly exclusive at both ends, like the store's
                        // $gt/$lt filter.
                        if event.created_at <= start || event.created_at >= end {
                            continue;
                        }
                        // Exports may overlap; keep the first copy of each id.
                        if seen_ids.insert(event.event_id.clone()) {
                            batch.events.push(event);
                        }
                    }
                    Err(record) => batch.malformed.push(record),
                }
            }
        }

        batch.events.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        debug!(
            "Loaded {} events ({} malformed) from {} files",
            batch.events.len(),
            batch.malformed.len(),
            jsonl_files.len()
        );

        Ok(batch)
    }
}

// ── Field extraction helpers ──────────────────────────────────────────────────

/// Read an identifier that is either a plain string or the export shape
/// `{"$oid": "..."}`, trying `keys` in order.
fn extract_id(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        let Some(field) = value.get(key) else { continue };
        if let Some(s) = field.as_str() {
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
        if let Some(oid) = field.get("$oid").and_then(|v| v.as_str()) {
            if !oid.is_empty() {
                return Some(oid.to_string());
            }
        }
    }
    None
}

/// Read a timestamp that is either an ISO string or the export shape
/// `{"$date": "..."}`.
fn extract_timestamp(field: &Value) -> Option<DateTime<Utc>> {
    if let Some(s) = field.as_str() {
        return time_utils::parse_timestamp(s);
    }
    if let Some(s) = field.get("$date").and_then(|v| v.as_str()) {
        return time_utils::parse_timestamp(s);
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
