//! Top-level report pipeline.
//!
//! Pulls a windowed event batch from the source, splits it into sessions,
//! aggregates the two report tables and returns them with run metadata. The
//! computation is a pure function of the fetched events and the
//! configuration; nothing is mutated outside the returned [`DailyReport`].

use chrono::Utc;
use metrics_core::config::ReportConfig;
use metrics_core::models::{DailyReport, ReportMetadata};
use metrics_core::{MetricsError, Result};
use tracing::info;

use crate::aggregator::SessionAggregator;
use crate::sessions::SessionSplitter;
use crate::source::EventSource;

/// Run the full report pipeline.
///
/// 1. Validate `config` (fails before any I/O on a bad parameter).
/// 2. Fetch events in the window `(start, end)`, both bounds exclusive.
/// 3. Fail with [`MetricsError::EmptyInput`] when no well-formed event is in
///    the window.
/// 4. Split each user's events into sessions with the cooloff rule.
/// 5. Aggregate session counts per user-day, then derive the active-users
///    table (strict `>`) and the threshold time series (`>=`).
///
/// Malformed records reported by the source are excluded from every
/// aggregate and surfaced through [`ReportMetadata::malformed_event_ids`].
pub fn generate_user_daily_report(
    source: &dyn EventSource,
    config: &ReportConfig,
) -> Result<DailyReport> {
    config.validate()?;
    let (start, end) = config.window_bounds();

    // ── Step 1: Fetch ─────────────────────────────────────────────────────────
    let fetch_start = std::time::Instant::now();
    let batch = source.fetch_events(start, end)?;
    let fetch_time = fetch_start.elapsed().as_secs_f64();

    if batch.events.is_empty() {
        return Err(MetricsError::EmptyInput { start, end });
    }

    // ── Step 2: Split and aggregate ───────────────────────────────────────────
    let transform_start = std::time::Instant::now();
    let splitter = SessionSplitter::new(config.cooloff());
    let starts = splitter.session_starts(&batch.events);

    let user_days = SessionAggregator::count_user_days(&starts);
    let daily_active_users =
        SessionAggregator::daily_active_users(&user_days, config.num_sessions_threshold);
    let timeseries =
        SessionAggregator::threshold_timeseries(&user_days, &config.session_count_thresholds);
    let transform_time = transform_start.elapsed().as_secs_f64();

    info!(
        "Report for {}: {} events, {} sessions, {} user-days, {} malformed",
        config.end_date,
        batch.events.len(),
        starts.len(),
        user_days.len(),
        batch.malformed.len()
    );

    // ── Step 3: Build result ──────────────────────────────────────────────────
    let metadata = ReportMetadata {
        generated_at: Utc::now().to_rfc3339(),
        window_start: start,
        window_end: end,
        events_processed: batch.events.len(),
        session_starts: starts.len(),
        malformed_event_ids: batch.malformed.iter().map(|m| m.event_id.clone()).collect(),
        fetch_time_seconds: fetch_time,
        transform_time_seconds: transform_time,
    };

    Ok(DailyReport {
        user_days,
        daily_active_users,
        timeseries,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
