//! TTL-cached report access.
//!
//! Wraps [`generate_user_daily_report`] with a configurable time-to-live
//! cache and retry logic for transient source failures. Callers use
//! [`ReportCache::get_report`] to obtain a fresh-or-cached [`DailyReport`];
//! the cache handles staleness checks, up to three fetch attempts with
//! backoff, and graceful fallback to the previous report when the source is
//! temporarily unreachable.

use std::thread;
use std::time::{Duration, Instant};

use metrics_core::config::ReportConfig;
use metrics_core::models::DailyReport;
use metrics_core::MetricsError;
use metrics_data::report::generate_user_daily_report;
use metrics_data::source::EventSource;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Maximum number of fetch attempts before giving up and returning stale data.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── ReportCache ───────────────────────────────────────────────────────────────

/// TTL-cached wrapper around the report pipeline.
pub struct ReportCache<S: EventSource> {
    /// Where events come from.
    source: S,
    /// Pipeline parameters for the cached report.
    config: ReportConfig,
    /// Maximum age of cached data before it is considered stale.
    cache_ttl: Duration,
    /// Most recently computed report.
    cache: Option<DailyReport>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
}

impl<S: EventSource> ReportCache<S> {
    /// Create a new cache.
    ///
    /// # Parameters
    /// - `source`        – event source queried on each fresh fetch.
    /// - `config`        – pipeline parameters.
    /// - `cache_ttl_secs` – seconds before cached data is considered stale.
    pub fn new(source: S, config: ReportConfig, cache_ttl_secs: u64) -> Self {
        Self {
            source,
            config,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache: None,
            cache_timestamp: None,
            last_error: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Return the report, using the cache when it is still valid.
    ///
    /// When `force_refresh` is `true` the cache is bypassed and a fresh
    /// computation is always attempted. On failure the previous cache (if
    /// any) is returned as a best-effort fallback and the error is kept in
    /// [`last_error`](Self::last_error).
    pub fn get_report(&mut self, force_refresh: bool) -> Option<&DailyReport> {
        if !force_refresh && self.is_cache_valid() {
            tracing::debug!("returning cached report");
            return self.cache.as_ref();
        }

        match self.fetch_with_retry() {
            Ok(report) => {
                tracing::debug!(
                    events = report.metadata.events_processed,
                    sessions = report.metadata.session_starts,
                    "report cache updated"
                );
                self.cache = Some(report);
                self.cache_timestamp = Some(Instant::now());
                self.last_error = None;
                self.cache.as_ref()
            }
            Err(e) => {
                tracing::warn!(error = %e, "report computation failed; falling back to cache");
                self.last_error = Some(e);
                // Return whatever we have, even if stale.
                self.cache.as_ref()
            }
        }
    }

    /// Replace the pipeline parameters, invalidating the cache when they
    /// actually changed (the watch loop uses this when the Pacific calendar
    /// rolls over to a new day).
    pub fn set_config(&mut self, config: ReportConfig) {
        if config.end_date != self.config.end_date
            || config.window_days != self.config.window_days
        {
            self.invalidate_cache();
        }
        self.config = config;
    }

    /// The currently configured pipeline parameters.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Discard the current cache, forcing the next
    /// [`get_report`](Self::get_report) call to recompute.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("report cache invalidated");
    }

    /// Age of the current cache entry, or `None` if no report has been
    /// computed yet.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Human-readable description of the last error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    /// `true` when the cache holds a report that is still within its TTL.
    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    /// Attempt up to [`MAX_RETRY_ATTEMPTS`] computations with backoff.
    ///
    /// Only transient source failures are retried (backoff schedule: 0 ms,
    /// 100 ms, 200 ms); a config, empty-input, or parse error is final on the
    /// first attempt.
    fn fetch_with_retry(&mut self) -> Result<DailyReport, String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying report after backoff");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match generate_user_daily_report(&self.source, &self.config) {
                Ok(report) => return Ok(report),
                Err(e) if is_transient(&e) => {
                    tracing::warn!(attempt, error = %e, "transient source failure");
                    last_err = e.to_string();
                }
                Err(e) => return Err(e.to_string()),
            }
        }

        Err(last_err)
    }
}

/// Whether an error is worth retrying.
fn is_transient(error: &MetricsError) -> bool {
    matches!(
        error,
        MetricsError::SourceUnavailable(_) | MetricsError::FileRead { .. } | MetricsError::Io(_)
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
