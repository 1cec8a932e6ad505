pub mod css;
pub mod load;
pub mod report;
pub mod schedule;

use crate::analyzer::report::{Dashboard, DashboardOptions, SavedReport};
use crate::analyzer::schedule::TrainingSchedule;
use crate::clock::Clock;
use crate::config::Config;
use crate::db::RecordStore;
use crate::records::Logbook;
use anyhow::{Context, Result};
use tracing::info;

/// Full re-fetch and recompute; nothing is cached between renders.
pub fn build_dashboard(
    config: &Config,
    store: &impl RecordStore,
    clock: &impl Clock,
) -> Result<Dashboard> {
    let logbook = Logbook::load(store).context("Failed to load logbook records")?;
    let schedule = load_schedule(config)?;

    info!(
        sessions = logbook.sessions.len(),
        targets = logbook.targets.len(),
        css_tests = logbook.css_tests.len(),
        "dashboard recomputed"
    );

    Ok(report::build_dashboard(
        &logbook,
        &schedule,
        clock,
        &DashboardOptions {
            title: config.team_name.clone(),
            recent_sessions: config.recent_sessions,
        },
    ))
}

pub fn generate_and_store_dashboard(
    config: &Config,
    store: &impl RecordStore,
    clock: &impl Clock,
) -> Result<(Dashboard, SavedReport)> {
    let dashboard = build_dashboard(config, store, clock)?;
    let saved =
        report::save_report_files(&dashboard, &report::report_stem(clock), &config.report_dir)?;

    Ok((dashboard, saved))
}

pub fn load_schedule(config: &Config) -> Result<TrainingSchedule> {
    TrainingSchedule::load(&config.schedule_path).with_context(|| {
        format!(
            "Failed to load training schedule: {}",
            config.schedule_path.display()
        )
    })
}
