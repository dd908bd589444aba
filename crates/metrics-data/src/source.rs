//! The event-source collaborator seam.
//!
//! The pipeline only ever sees a time-windowed batch of events; where they
//! come from (a document store export, a fixture, an in-memory vector) is the
//! source's concern.

use chrono::{DateTime, Utc};
use metrics_core::models::LogEvent;
use metrics_core::Result;

// ── Batch types ───────────────────────────────────────────────────────────────

/// A record the source could not turn into a [`LogEvent`].
///
/// Malformed records are excluded from aggregation but never silently
/// dropped; the pipeline reports their ids alongside the result.
#[derive(Debug, Clone)]
pub struct MalformedRecord {
    /// The record's id, or `"<unknown>"` when even the id was unreadable.
    pub event_id: String,
    /// Why the record was rejected.
    pub reason: String,
}

/// The result of one windowed fetch: well-formed events plus notes about
/// records that failed to parse.
#[derive(Debug, Clone, Default)]
pub struct EventBatch {
    pub events: Vec<LogEvent>,
    pub malformed: Vec<MalformedRecord>,
}

// ── EventSource ───────────────────────────────────────────────────────────────

/// A queryable store of log events.
///
/// `fetch_events` must return exactly the events with
/// `start < created_at < end` (strictly exclusive at both ends, matching the
/// store's `$gt`/`$lt` filter semantics). Connectivity failures surface as
/// [`metrics_core::MetricsError::SourceUnavailable`]; retry policy belongs to
/// the caller, not the source.
pub trait EventSource {
    fn fetch_events(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<EventBatch>;
}

// ── MemoryEventSource ─────────────────────────────────────────────────────────

/// An in-memory event source, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    events: Vec<LogEvent>,
}

impl MemoryEventSource {
    pub fn new(events: Vec<LogEvent>) -> Self {
        Self { events }
    }
}

impl EventSource for MemoryEventSource {
    fn fetch_events(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<EventBatch> {
        let events = self
            .events
            .iter()
            .filter(|e| e.created_at > start && e.created_at < end)
            .cloned()
            .collect();
        Ok(EventBatch {
            events,
            malformed: Vec::new(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: &str, user: &str, ts: DateTime<Utc>) -> LogEvent {
        LogEvent {
            event_id: id.to_string(),
            user_id: user.to_string(),
            event_type: String::new(),
            created_at: ts,
        }
    }

    #[test]
    fn test_memory_source_filters_window() {
        let start = Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 3, 2, 0, 0, 0).unwrap();
        let source = MemoryEventSource::new(vec![
            event("before", "u1", start - chrono::TimeDelta::seconds(1)),
            event("inside", "u1", start + chrono::TimeDelta::hours(1)),
            event("after", "u1", end + chrono::TimeDelta::seconds(1)),
        ]);

        let batch = source.fetch_events(start, end).unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].event_id, "inside");
    }

    #[test]
    fn test_memory_source_bounds_are_exclusive() {
        let start = Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 3, 2, 0, 0, 0).unwrap();
        let source = MemoryEventSource::new(vec![
            event("at-start", "u1", start),
            event("at-end", "u1", end),
        ]);

        let batch = source.fetch_events(start, end).unwrap();
        assert!(
            batch.events.is_empty(),
            "boundary timestamps must be excluded"
        );
    }

    #[test]
    fn test_memory_source_empty() {
        let start = Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 3, 2, 0, 0, 0).unwrap();
        let batch = MemoryEventSource::default()
            .fetch_events(start, end)
            .unwrap();
        assert!(batch.events.is_empty());
        assert!(batch.malformed.is_empty());
    }
}
