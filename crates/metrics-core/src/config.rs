use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::time_utils;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default trailing window, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// Default inactivity cooloff after which the next event opens a new session.
pub const DEFAULT_ACTIVITY_COOLOFF_MINS: i64 = 10;

/// Default minimum session count for a user-day to count as "active"
/// (strictly greater-than).
pub const DEFAULT_NUM_SESSIONS_THRESHOLD: u32 = 5;

/// Default threshold set for the comparative time series.
pub const DEFAULT_SESSION_COUNT_THRESHOLDS: &[u32] = &[1, 3, 5];

// ── ReportConfig ──────────────────────────────────────────────────────────────

/// Parameters of one report invocation.
///
/// Validated as a whole before any computation runs; an invalid value fails
/// the invocation with [`MetricsError::InvalidConfig`] naming the parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// The report's reference date; the window ends at this date's Pacific
    /// midnight.
    pub end_date: NaiveDate,
    /// Length of the trailing event window in days (>= 1).
    pub window_days: u32,
    /// Idle minutes after which a user's next event starts a new session
    /// (>= 0).
    pub activity_cooloff_mins: i64,
    /// A user-day is "active" when `num_sessions` strictly exceeds this.
    pub num_sessions_threshold: u32,
    /// Strictly ascending, non-empty threshold set for the time series.
    pub session_count_thresholds: Vec<u32>,
}

impl ReportConfig {
    /// A config with all defaults for the given reference date.
    pub fn for_end_date(end_date: NaiveDate) -> Self {
        Self {
            end_date,
            window_days: DEFAULT_WINDOW_DAYS,
            activity_cooloff_mins: DEFAULT_ACTIVITY_COOLOFF_MINS,
            num_sessions_threshold: DEFAULT_NUM_SESSIONS_THRESHOLD,
            session_count_thresholds: DEFAULT_SESSION_COUNT_THRESHOLDS.to_vec(),
        }
    }

    /// Check every parameter, reporting the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.window_days == 0 {
            return Err(MetricsError::InvalidConfig {
                parameter: "window_days",
                message: "must be >= 1, got 0".to_string(),
            });
        }
        if self.activity_cooloff_mins < 0 {
            return Err(MetricsError::InvalidConfig {
                parameter: "activity_cooloff_mins",
                message: format!("must be >= 0, got {}", self.activity_cooloff_mins),
            });
        }
        if self.num_sessions_threshold == 0 {
            return Err(MetricsError::InvalidConfig {
                parameter: "num_sessions_threshold",
                message: "must be >= 1, got 0".to_string(),
            });
        }
        if self.session_count_thresholds.is_empty() {
            return Err(MetricsError::InvalidConfig {
                parameter: "session_count_thresholds",
                message: "must not be empty".to_string(),
            });
        }
        let mut previous: Option<u32> = None;
        for &t in &self.session_count_thresholds {
            if t == 0 {
                return Err(MetricsError::InvalidConfig {
                    parameter: "session_count_thresholds",
                    message: "thresholds must be positive".to_string(),
                });
            }
            if let Some(prev) = previous {
                if t <= prev {
                    return Err(MetricsError::InvalidConfig {
                        parameter: "session_count_thresholds",
                        message: format!("must be strictly ascending, got {} after {}", t, prev),
                    });
                }
            }
            previous = Some(t);
        }
        Ok(())
    }

    /// The UTC bounds of the event window.
    ///
    /// `end` is Pacific midnight at the start of `end_date`; `start` is
    /// `window_days` before it. Sources must treat both bounds as strictly
    /// exclusive (`start < created_at < end`), mirroring the store's
    /// `$gt`/`$lt` filter.
    pub fn window_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = time_utils::pacific_midnight(self.end_date);
        let start = end - TimeDelta::days(i64::from(self.window_days));
        (start, end)
    }

    /// The cooloff as a [`TimeDelta`].
    pub fn cooloff(&self) -> TimeDelta {
        TimeDelta::minutes(self.activity_cooloff_mins)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> ReportConfig {
        ReportConfig::for_end_date(NaiveDate::from_ymd_opt(2022, 3, 15).unwrap())
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_for_end_date_uses_documented_defaults() {
        let cfg = config();
        assert_eq!(cfg.window_days, 14);
        assert_eq!(cfg.activity_cooloff_mins, 10);
        assert_eq!(cfg.num_sessions_threshold, 5);
        assert_eq!(cfg.session_count_thresholds, vec![1, 3, 5]);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(config().validate().is_ok());
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut cfg = config();
        cfg.window_days = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("window_days"));
    }

    #[test]
    fn test_validate_rejects_negative_cooloff() {
        let mut cfg = config();
        cfg.activity_cooloff_mins = -1;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("activity_cooloff_mins"));
    }

    #[test]
    fn test_validate_accepts_zero_cooloff() {
        let mut cfg = config();
        cfg.activity_cooloff_mins = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sessions_threshold() {
        let mut cfg = config();
        cfg.num_sessions_threshold = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("num_sessions_threshold"));
    }

    #[test]
    fn test_validate_rejects_empty_thresholds() {
        let mut cfg = config();
        cfg.session_count_thresholds.clear();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("session_count_thresholds"));
    }

    #[test]
    fn test_validate_rejects_zero_threshold_member() {
        let mut cfg = config();
        cfg.session_count_thresholds = vec![0, 3];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unordered_thresholds() {
        let mut cfg = config();
        cfg.session_count_thresholds = vec![3, 1, 5];
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("strictly ascending"));
    }

    #[test]
    fn test_validate_rejects_duplicate_thresholds() {
        let mut cfg = config();
        cfg.session_count_thresholds = vec![1, 3, 3];
        assert!(cfg.validate().is_err());
    }

    // ── window_bounds ─────────────────────────────────────────────────────────

    #[test]
    fn test_window_bounds_end_is_pacific_midnight() {
        let (_, end) = config().window_bounds();
        // 2022-03-15 is PDT (UTC-7): local midnight = 07:00 UTC.
        assert_eq!(end, Utc.with_ymd_and_hms(2022, 3, 15, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_window_bounds_span_is_window_days() {
        let (start, end) = config().window_bounds();
        assert_eq!(end - start, TimeDelta::days(14));
    }

    #[test]
    fn test_cooloff_delta() {
        assert_eq!(config().cooloff(), TimeDelta::minutes(10));
    }
}
