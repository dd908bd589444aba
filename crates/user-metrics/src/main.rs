mod bootstrap;
mod render;

use anyhow::{anyhow, Result};
use metrics_core::settings::Settings;
use metrics_core::MetricsError;
use metrics_data::reader::JsonlEventSource;
use metrics_data::report::generate_user_daily_report;
use metrics_runtime::refresher::ReportOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("user-metrics v{} starting", env!("CARGO_PKG_VERSION"));

    let config = settings.report_config();
    tracing::info!(
        "Report date: {}, window: {} days, cooloff: {} min, thresholds: {:?}",
        config.end_date,
        config.window_days,
        config.activity_cooloff_mins,
        config.session_count_thresholds
    );

    let data_path = settings
        .data_path
        .clone()
        .or_else(bootstrap::discover_data_path)
        .ok_or_else(|| {
            anyhow!("no event data found; pass --data-path or create ./log_events")
        })?;
    tracing::info!("Reading events from {}", data_path.display());
    let source = JsonlEventSource::new(&data_path);

    if settings.watch {
        tracing::info!(
            "Watching: recomputing every {} seconds",
            settings.refresh_rate
        );

        // A date given on the command line stays pinned; otherwise the report
        // follows "today" across Pacific midnights.
        let orchestrator = ReportOrchestrator::new(
            u64::from(settings.refresh_rate),
            source,
            config.clone(),
            settings.date,
        );
        let (mut rx, handle) = orchestrator.start();

        let sessions_threshold = config.num_sessions_threshold;
        let format = settings.format.clone();

        // Render every snapshot until the channel closes or Ctrl+C arrives.
        tokio::select! {
            result = async {
                while let Some(snapshot) = rx.recv().await {
                    if let Some(err) = &snapshot.last_error {
                        tracing::warn!("showing stale report: {}", err);
                    }
                    print_report(&snapshot.report, &format, sessions_threshold)?;
                }
                Ok::<(), anyhow::Error>(())
            } => {
                handle.abort();
                result?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; shutting down refresh task");
                handle.abort();
            }
        }

        return Ok(());
    }

    // One-shot batch run.
    match generate_user_daily_report(&source, &config) {
        Ok(report) => print_report(&report, &settings.format, config.num_sessions_threshold),
        Err(MetricsError::EmptyInput { start, end }) => {
            // An empty window is a report-worthy outcome, not a crash.
            println!("No events between {} and {}; nothing to report.", start, end);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Print the report in the requested format.
fn print_report(
    report: &metrics_core::models::DailyReport,
    format: &str,
    sessions_threshold: u32,
) -> Result<()> {
    match format {
        "csv" => print!("{}", render::render_csv(report)),
        "json" => println!("{}", render::render_json(report)?),
        _ => print!("{}", render::render_tables(report, sessions_threshold)),
    }
    Ok(())
}
