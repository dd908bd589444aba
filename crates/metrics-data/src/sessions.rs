//! Session splitting over raw log events.
//!
//! A session is a contiguous run of one user's events where consecutive gaps
//! stay below the inactivity cooloff. Only the first event of each run is
//! retained; each retained event represents exactly one session and carries
//! the session's Pacific calendar date.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use metrics_core::models::{LogEvent, SessionStart};
use metrics_core::time_utils;
use tracing::debug;

// ── SessionSplitter ───────────────────────────────────────────────────────────

/// Splits a windowed event batch into session-start events.
pub struct SessionSplitter {
    /// Minimum idle duration after which the next event opens a new session.
    cooloff: TimeDelta,
}

impl SessionSplitter {
    pub fn new(cooloff: TimeDelta) -> Self {
        Self { cooloff }
    }

    /// Detect the session-start events in `events`.
    ///
    /// The algorithm:
    /// 1. Partition events by `user_id` and sort each partition by
    ///    `created_at` ascending (the input need not be sorted).
    /// 2. Compute each event's gap to the immediately preceding event of the
    ///    same user in the window. The first event of a partition has no gap.
    /// 3. An event starts a session when it has no gap or its gap is
    ///    `>= cooloff`; the boundary is inclusive toward "new session", so
    ///    two events exactly one cooloff apart land in different sessions.
    ///
    /// Gaps are measured against the previous event regardless of calendar
    /// date, so a session that straddles local midnight is still one session,
    /// attributed to the date of its first event.
    pub fn session_starts(&self, events: &[LogEvent]) -> Vec<SessionStart> {
        let mut by_user: BTreeMap<&str, Vec<&LogEvent>> = BTreeMap::new();
        for event in events {
            by_user.entry(event.user_id.as_str()).or_default().push(event);
        }

        let mut starts: Vec<SessionStart> = Vec::new();
        for (_, mut user_events) in by_user {
            // Stable sort keeps equal-timestamp events in input order.
            user_events.sort_by_key(|e| e.created_at);

            let mut previous: Option<DateTime<Utc>> = None;
            for event in user_events {
                let is_start = match previous {
                    None => true,
                    Some(prev) => event.created_at - prev >= self.cooloff,
                };
                if is_start {
                    starts.push(SessionStart {
                        event_id: event.event_id.clone(),
                        user_id: event.user_id.clone(),
                        started_at: event.created_at,
                        date: time_utils::pacific_date(event.created_at),
                    });
                }
                previous = Some(event.created_at);
            }
        }

        debug!(
            "SessionSplitter: {} session starts from {} events",
            starts.len(),
            events.len()
        );
        starts
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
