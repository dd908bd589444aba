//! Plain-text, CSV and JSON rendering of the report tables.
//!
//! The report's consumers are a terminal (aligned tables), spreadsheets
//! (CSV), or other tooling (JSON); the pipeline itself never formats
//! anything.

use metrics_core::models::DailyReport;

// ── Table rendering ───────────────────────────────────────────────────────────

/// Render both report tables as aligned plain text.
pub fn render_tables(report: &DailyReport, sessions_threshold: u32) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Daily active users (more than {} sessions per day)\n",
        sessions_threshold
    ));
    out.push_str(&format!("{:<12} {:>9}\n", "date", "num_users"));
    if report.daily_active_users.is_empty() {
        out.push_str("(no user exceeded the threshold in this window)\n");
    }
    for row in &report.daily_active_users {
        out.push_str(&format!("{:<12} {:>9}\n", row.date, row.num_users));
    }

    out.push('\n');
    out.push_str("Daily users by minimum session count\n");
    let labels = report.timeseries.series_labels();
    out.push_str(&format!("{:<12}", "date"));
    for label in &labels {
        out.push_str(&format!(" {:>8}", label));
    }
    out.push('\n');
    for row in &report.timeseries.rows {
        out.push_str(&format!("{:<12}", row.date));
        for count in &row.num_users {
            out.push_str(&format!(" {:>8}", count));
        }
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&format!(
        "{} events, {} sessions, {} user-days",
        report.metadata.events_processed,
        report.metadata.session_starts,
        report.user_days.len()
    ));
    if report.metadata.malformed_count() > 0 {
        out.push_str(&format!(
            " ({} malformed records excluded)",
            report.metadata.malformed_count()
        ));
    }
    out.push('\n');

    out
}

// ── CSV rendering ─────────────────────────────────────────────────────────────

/// Render both report tables as CSV, separated by `#`-prefixed section
/// headers.
pub fn render_csv(report: &DailyReport) -> String {
    let mut out = String::new();

    out.push_str("# daily_active_users\n");
    out.push_str("date,num_users\n");
    for row in &report.daily_active_users {
        out.push_str(&format!("{},{}\n", row.date, row.num_users));
    }

    out.push_str("# threshold_timeseries\n");
    out.push_str("date");
    for label in report.timeseries.series_labels() {
        out.push(',');
        out.push_str(&label);
    }
    out.push('\n');
    for row in &report.timeseries.rows {
        out.push_str(&row.date.to_string());
        for count in &row.num_users {
            out.push_str(&format!(",{}", count));
        }
        out.push('\n');
    }

    out
}

// ── JSON rendering ────────────────────────────────────────────────────────────

/// Render the complete report (tables plus metadata) as pretty JSON.
pub fn render_json(report: &DailyReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
