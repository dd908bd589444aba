//! Async report refresher.
//!
//! Recomputes the report on an interval in a tokio task, sending
//! [`ReportSnapshot`]s through an `mpsc` channel so the rendering loop can
//! consume them without any shared mutable state.

use std::time::Duration;

use chrono::NaiveDate;
use metrics_core::config::ReportConfig;
use metrics_core::models::DailyReport;
use metrics_core::time_utils;
use metrics_data::source::EventSource;
use tokio::sync::mpsc;
use tokio::time;

use crate::report_cache::{ReportCache, DEFAULT_CACHE_TTL_SECS};

// ── Public types ──────────────────────────────────────────────────────────────

/// A single refresh result forwarded to the rendering layer.
///
/// This is the primary data contract between the background runtime and the
/// presentation layer.
#[derive(Debug, Clone)]
pub struct ReportSnapshot {
    /// The report as of this refresh (possibly a stale fallback, see
    /// `last_error`).
    pub report: DailyReport,
    /// Set when the most recent refresh failed and `report` is the previous
    /// cached result.
    pub last_error: Option<String>,
}

// ── ReportOrchestrator ────────────────────────────────────────────────────────

/// Background refresh coordinator for watch mode.
///
/// Call [`ReportOrchestrator::start`] to spin up the refresh loop in a
/// dedicated tokio task and receive a channel endpoint for
/// [`ReportSnapshot`] updates.
pub struct ReportOrchestrator<S: EventSource> {
    /// How often to recompute the report.
    update_interval: Duration,
    /// Event source handed to the report cache.
    source: S,
    /// Pipeline parameters; `end_date` is re-resolved each tick unless
    /// pinned.
    config: ReportConfig,
    /// When set, the report stays anchored to this date instead of following
    /// the Pacific calendar.
    pinned_end_date: Option<NaiveDate>,
}

impl<S: EventSource + Send + 'static> ReportOrchestrator<S> {
    /// Create a new orchestrator.
    ///
    /// # Parameters
    /// - `update_interval_secs` – seconds between refreshes.
    /// - `source`               – event source to query.
    /// - `config`               – pipeline parameters; pass
    ///   `pinned_end_date = Some(config.end_date)` when the user asked for a
    ///   specific date, `None` to follow "today" across midnight.
    pub fn new(
        update_interval_secs: u64,
        source: S,
        config: ReportConfig,
        pinned_end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            update_interval: Duration::from_secs(update_interval_secs),
            source,
            config,
            pinned_end_date,
        }
    }

    /// Start the refresh loop.
    ///
    /// Spawns a tokio task that runs the loop. Returns:
    /// - An `mpsc::Receiver<ReportSnapshot>` for the caller to poll.
    /// - A [`RefreshHandle`] that can be used to abort the loop.
    pub fn start(self) -> (mpsc::Receiver<ReportSnapshot>, RefreshHandle) {
        // Buffer a modest number of snapshots so slow consumers don't stall
        // the loop.
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.refresh_loop(tx).await;
        });

        (rx, RefreshHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────────

    /// The main refresh loop.
    ///
    /// Performs an immediate computation on startup, then repeats on
    /// `update_interval`. The loop exits when the receiver side of the
    /// channel is closed.
    async fn refresh_loop(self, tx: mpsc::Sender<ReportSnapshot>) {
        let pinned = self.pinned_end_date;
        let mut cache = ReportCache::new(self.source, self.config, DEFAULT_CACHE_TTL_SECS);

        // Initial computation (force refresh to populate immediately).
        Self::refresh_and_send(&mut cache, pinned, &tx, true).await;

        let mut interval = time::interval(self.update_interval);
        // Consume the first tick which fires immediately; we already
        // computed above.
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("snapshot channel closed; exiting refresh loop");
                break;
            }

            Self::refresh_and_send(&mut cache, pinned, &tx, false).await;
        }
    }

    /// Recompute (or reuse) the report and send a snapshot to the channel.
    async fn refresh_and_send(
        cache: &mut ReportCache<S>,
        pinned_end_date: Option<NaiveDate>,
        tx: &mpsc::Sender<ReportSnapshot>,
        force: bool,
    ) {
        // Follow the Pacific calendar unless the user pinned a date; crossing
        // midnight invalidates the cache via the config change.
        let end_date = pinned_end_date.unwrap_or_else(time_utils::today_pacific);
        if cache.config().end_date != end_date {
            let mut config = cache.config().clone();
            config.end_date = end_date;
            cache.set_config(config);
        }

        let report = match cache.get_report(force) {
            Some(r) => r.clone(),
            None => {
                tracing::warn!("no report available; skipping snapshot");
                return;
            }
        };
        let last_error = cache.last_error().map(|s| s.to_string());

        let snapshot = ReportSnapshot { report, last_error };
        if let Err(e) = tx.send(snapshot).await {
            tracing::warn!(error = %e, "failed to send snapshot; receiver dropped");
        }
    }
}

// ── RefreshHandle ─────────────────────────────────────────────────────────────

/// A handle to the background refresh task.
///
/// Drop or call [`RefreshHandle::abort`] to stop the loop.
pub struct RefreshHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl RefreshHandle {
    /// Immediately abort the refresh loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
