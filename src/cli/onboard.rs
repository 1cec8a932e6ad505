use crate::analyzer::load_schedule;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, DEFAULT_RECENT_SESSIONS, expand_home};
use crate::db::Database;
use anyhow::{Context, Result};
use dialoguer::{Input, theme::ColorfulTheme};

pub fn run_onboarding() -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to SwimLog onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();
    let defaults = Config::default();

    println!("\n[1/3] Team name");
    let team_name: String = Input::with_theme(&theme)
        .with_prompt("  Shown as the dashboard title")
        .default(defaults.team_name.clone())
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("Team name must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read team name")?;

    println!("\n[2/3] Report output directory");
    let report_dir_input: String = Input::with_theme(&theme)
        .with_prompt("  Folder where weekly dashboards will be saved")
        .default(defaults.report_dir.display().to_string())
        .interact_text()
        .context("Failed to read report directory")?;
    let report_dir = expand_home(&report_dir_input);
    println!("  ✓ {}", report_dir.display());

    println!("\n[3/3] Recent sessions on the dashboard");
    let recent_sessions: usize = Input::with_theme(&theme)
        .with_prompt("  How many recent sessions to list")
        .default(DEFAULT_RECENT_SESSIONS)
        .validate_with(|input: &usize| -> std::result::Result<(), &str> {
            if *input == 0 {
                Err("Must be at least 1")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read recent session count")?;

    let config = Config {
        team_name: team_name.trim().to_string(),
        report_dir,
        recent_sessions,
        ..defaults
    };

    config.ensure_bootstrap_files()?;
    config.save()?;
    let _ = Database::open(&config.db_path)?;
    let schedule = load_schedule(&config)?;

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  Training schedule: {}", config.schedule_path.display());
    if let Some(next) = schedule.next_session(SystemClock.today()) {
        println!("  Next session: {} - {}", next.label, next.description);
    }
    println!("  Run `swimlog log` to record your first session.");
    println!("──────────────────────────────────────────");

    Ok(config)
}
