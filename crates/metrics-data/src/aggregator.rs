//! Aggregation of session starts into the two report tables.
//!
//! Stage 3 counts sessions per user per Pacific date; stage 4a filters and
//! counts "active" users per date; stage 4b pivots user-day counts across the
//! configured threshold set.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use metrics_core::models::{
    DailyActiveUsersRow, SessionStart, ThresholdTimeseries, TimeseriesRow, UserDayAggregate,
};

// ── SessionAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that turns session starts into report rows.
pub struct SessionAggregator;

impl SessionAggregator {
    /// Count session starts per (`user_id`, date).
    ///
    /// Returns one row per user per day that has at least one session,
    /// sorted by (`user_id`, date).
    pub fn count_user_days(starts: &[SessionStart]) -> Vec<UserDayAggregate> {
        // BTreeMap for deterministic, sorted output.
        let mut counts: BTreeMap<(String, NaiveDate), u32> = BTreeMap::new();
        for start in starts {
            *counts
                .entry((start.user_id.clone(), start.date))
                .or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|((user_id, date), num_sessions)| UserDayAggregate {
                user_id,
                date,
                num_sessions,
            })
            .collect()
    }

    /// Count users whose `num_sessions` strictly exceeds `threshold`, per
    /// date.
    ///
    /// Note the strict `>`: a user-day exactly at the threshold does not
    /// count. This deliberately differs from the `>=` used by
    /// [`threshold_timeseries`](Self::threshold_timeseries).
    ///
    /// Returns rows sorted by date; dates where no user qualifies produce no
    /// row.
    pub fn daily_active_users(
        user_days: &[UserDayAggregate],
        threshold: u32,
    ) -> Vec<DailyActiveUsersRow> {
        let mut per_date: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for row in user_days {
            if row.num_sessions > threshold {
                *per_date.entry(row.date).or_insert(0) += 1;
            }
        }

        per_date
            .into_iter()
            .map(|(date, num_users)| DailyActiveUsersRow { date, num_users })
            .collect()
    }

    /// For every threshold T, count users with `num_sessions >= T`, per date.
    ///
    /// Counts are cumulative across thresholds, so for a fixed date they are
    /// monotonically non-increasing in T. Every date with at least one
    /// user-day row gets a row, even when all of its counts are zero for the
    /// higher thresholds.
    pub fn threshold_timeseries(
        user_days: &[UserDayAggregate],
        thresholds: &[u32],
    ) -> ThresholdTimeseries {
        let mut per_date: BTreeMap<NaiveDate, Vec<u32>> = BTreeMap::new();
        for row in user_days {
            let counts = per_date
                .entry(row.date)
                .or_insert_with(|| vec![0; thresholds.len()]);
            for (idx, &threshold) in thresholds.iter().enumerate() {
                if row.num_sessions >= threshold {
                    counts[idx] += 1;
                }
            }
        }

        ThresholdTimeseries {
            thresholds: thresholds.to_vec(),
            rows: per_date
                .into_iter()
                .map(|(date, num_users)| TimeseriesRow { date, num_users })
                .collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
