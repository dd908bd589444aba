use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single raw log record read from the event store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Unique identifier of the record.
    pub event_id: String,
    /// Identifier of the acting user.
    pub user_id: String,
    /// Backend event category (e.g. `"api_hit_/tasks/"`); carried through
    /// but not used by the aggregation pipeline.
    #[serde(default)]
    pub event_type: String,
    /// UTC timestamp when the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// An event retained as the first event of a session.
///
/// `date` is the Pacific-time calendar date of `started_at`; it decides which
/// day the session is attributed to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStart {
    /// Identifier of the event that opened the session.
    pub event_id: String,
    /// Identifier of the session's user.
    pub user_id: String,
    /// UTC timestamp of the session's first event.
    pub started_at: DateTime<Utc>,
    /// Local (Pacific) calendar date the session belongs to.
    pub date: NaiveDate,
}

/// Number of sessions one user started on one local date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDayAggregate {
    pub user_id: String,
    pub date: NaiveDate,
    pub num_sessions: u32,
}

/// Count of users whose session count exceeded the configured threshold on
/// one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActiveUsersRow {
    pub date: NaiveDate,
    pub num_users: u32,
}

/// One date's user counts across every configured threshold.
///
/// `num_users` is parallel to [`ThresholdTimeseries::thresholds`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeseriesRow {
    pub date: NaiveDate,
    pub num_users: Vec<u32>,
}

/// Daily user counts broken out by minimum-session-count threshold.
///
/// Counts are cumulative, not mutually exclusive buckets: a user with five
/// sessions on a date counts toward every threshold `<= 5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdTimeseries {
    /// The ordered threshold set the series were computed for.
    pub thresholds: Vec<u32>,
    /// One row per date with at least one user-day aggregate, ascending.
    pub rows: Vec<TimeseriesRow>,
}

impl ThresholdTimeseries {
    /// Display labels for the series, one per threshold (`"gt_1"`, `"gt_3"`, ...).
    pub fn series_labels(&self) -> Vec<String> {
        self.thresholds.iter().map(|t| format!("gt_{}", t)).collect()
    }

    /// Look up the user count for `date` under `threshold`.
    ///
    /// Returns `None` when the date has no row or the threshold is not part
    /// of the configured set.
    pub fn count_for(&self, date: NaiveDate, threshold: u32) -> Option<u32> {
        let idx = self.thresholds.iter().position(|&t| t == threshold)?;
        self.rows
            .iter()
            .find(|r| r.date == date)
            .map(|r| r.num_users[idx])
    }
}

/// Metadata produced alongside the report tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Exclusive lower bound of the event window (UTC).
    pub window_start: DateTime<Utc>,
    /// Exclusive upper bound of the event window (UTC).
    pub window_end: DateTime<Utc>,
    /// Number of well-formed events that entered the pipeline.
    pub events_processed: usize,
    /// Number of events retained as session starts.
    pub session_starts: usize,
    /// Ids of records that failed to parse and were excluded.
    pub malformed_event_ids: Vec<String>,
    /// Wall-clock seconds spent fetching events from the source.
    pub fetch_time_seconds: f64,
    /// Wall-clock seconds spent in the aggregation stages.
    pub transform_time_seconds: f64,
}

impl ReportMetadata {
    /// Number of records excluded from aggregation because they failed to
    /// parse.
    pub fn malformed_count(&self) -> usize {
        self.malformed_event_ids.len()
    }
}

/// The complete output of one pipeline invocation.
///
/// Either every table is populated consistently or the pipeline returned an
/// error; there is no partially-built report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    /// Session counts per user per local date.
    pub user_days: Vec<UserDayAggregate>,
    /// Users above the activity threshold, per date.
    pub daily_active_users: Vec<DailyActiveUsersRow>,
    /// User counts across the configured threshold set, per date.
    pub timeseries: ThresholdTimeseries,
    /// Metadata about this report run.
    pub metadata: ReportMetadata,
}

impl DailyReport {
    /// Sum of `num_sessions` across all user-day rows.
    pub fn total_sessions(&self) -> u64 {
        self.user_days.iter().map(|r| u64::from(r.num_sessions)).sum()
    }
}
