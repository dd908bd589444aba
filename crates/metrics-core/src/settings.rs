use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{
    ReportConfig, DEFAULT_ACTIVITY_COOLOFF_MINS, DEFAULT_NUM_SESSIONS_THRESHOLD,
    DEFAULT_WINDOW_DAYS,
};
use crate::time_utils;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Daily active users report over backend log events
#[derive(Parser, Debug, Clone)]
#[command(
    name = "user-metrics",
    about = "Daily active users report over backend log events",
    version
)]
pub struct Settings {
    /// Report reference date (YYYY-MM-DD, default: today in Pacific time)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Trailing window length in days
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: u32,

    /// Idle minutes after which the next event starts a new session
    #[arg(long, default_value_t = DEFAULT_ACTIVITY_COOLOFF_MINS)]
    pub cooloff_mins: i64,

    /// Minimum session count (exclusive) for a user-day to count as active
    #[arg(long, default_value_t = DEFAULT_NUM_SESSIONS_THRESHOLD)]
    pub sessions_threshold: u32,

    /// Comma-separated threshold set for the comparative time series
    #[arg(long, value_delimiter = ',', default_values_t = [1u32, 3, 5])]
    pub thresholds: Vec<u32>,

    /// Directory holding the exported log-event JSONL files
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "csv", "json"])]
    pub format: String,

    /// Recompute and re-render on an interval instead of exiting
    #[arg(long)]
    pub watch: bool,

    /// Refresh interval in seconds for --watch (5-3600)
    #[arg(long, default_value = "300", value_parser = clap::value_parser!(u32).range(5..=3600))]
    pub refresh_rate: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.user-metrics/last_used.json`.
///
/// Only presentation and environment settings are persisted; the analysis
/// parameters (date, cooloff, thresholds) always come from the command line
/// or their documented defaults so that two runs with the same flags mean the
/// same thing.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.user-metrics/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".user-metrics").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());

        // Parse into the typed struct using the same args.
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // Merge last-used values for fields that were NOT explicitly set on
        // the command line (CLI always wins). The analysis parameters (date,
        // cooloff, thresholds) are never loaded from last-used.
        if !is_arg_explicitly_set(&matches, "window_days") {
            if let Some(v) = last.window_days {
                settings.window_days = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "data_path") && settings.data_path.is_none() {
            settings.data_path = last.data_path;
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate {
                settings.refresh_rate = v;
            }
        }

        settings = Self::apply_debug(settings);

        // Persist current settings for next run.
        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Build the pipeline configuration from the parsed flags.
    ///
    /// `--date` defaults to today on the Pacific calendar, the same calendar
    /// the report buckets sessions in.
    pub fn report_config(&self) -> ReportConfig {
        ReportConfig {
            end_date: self.date.unwrap_or_else(time_utils::today_pacific),
            window_days: self.window_days,
            activity_cooloff_mins: self.cooloff_mins,
            num_sessions_threshold: self.sessions_threshold,
            session_count_thresholds: self.thresholds.clone(),
        }
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            window_days: Some(s.window_days),
            data_path: s.data_path.clone(),
            format: Some(s.format.clone()),
            refresh_rate: Some(s.refresh_rate),
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
