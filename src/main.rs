mod analyzer;
mod api;
mod cli;
mod clock;
mod config;
mod db;
mod error;
mod records;

use crate::analyzer::report::{Dashboard, render_markdown};
use crate::cli::forms::{collect_css_test, collect_session, collect_target};
use crate::cli::onboard::run_onboarding;
use crate::cli::{Cli, Commands, ConfigCommands, CssArgs, LogArgs, TargetArgs};
use crate::clock::{Clock, FixedClock, SystemClock};
use crate::config::Config;
use crate::db::{Database, RecordStore, Table};
use crate::records::parse_iso_date;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            let _ = run_onboarding()?;
            Ok(())
        }
        Commands::Log(args) => handle_log(args),
        Commands::Css(args) => handle_css(args),
        Commands::Target(args) => handle_target(args),
        Commands::Dashboard { as_of, json } => handle_dashboard(as_of, json),
        Commands::Next { as_of } => handle_next(as_of),
        Commands::List { table } => handle_list(table),
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
        Commands::Doctor => handle_doctor(),
        Commands::Serve => {
            let config = load_or_default_config()?;
            let database = Database::open(&config.db_path)?;
            api::run_server(Arc::new(config), database, Arc::new(SystemClock)).await
        }
    }
}

fn handle_log(args: LogArgs) -> Result<()> {
    let config = load_or_default_config()?;
    let mut database = Database::open(&config.db_path)?;

    let session = collect_session(args)?.into_session(SystemClock.today())?;
    records::save_session(&mut database, &session)?;

    println!("Session logged successfully!");
    println!(
        "- {} {} {}m RPE {}",
        session.date, session.swimmer, session.distance_m, session.rpe
    );
    Ok(())
}

fn handle_css(args: CssArgs) -> Result<()> {
    let config = load_or_default_config()?;
    let mut database = Database::open(&config.db_path)?;

    let test = collect_css_test(args)?.into_css_test(SystemClock.today())?;
    records::save_css_test(&mut database, &test)?;

    println!("CSS Pace: {:.2} s/100m", test.css_s_per_100);
    Ok(())
}

fn handle_target(args: TargetArgs) -> Result<()> {
    let config = load_or_default_config()?;
    let mut database = Database::open(&config.db_path)?;

    let target = collect_target(args)?.into_target(SystemClock.today())?;
    records::save_target(&mut database, &target)?;

    println!("Target set!");
    println!(
        "- {} week of {}: {:.1} km",
        target.swimmer, target.week_start, target.km_target
    );
    Ok(())
}

fn handle_dashboard(as_of: Option<String>, json: bool) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;
    let clock = resolve_clock(as_of)?;

    let (dashboard, saved) = analyzer::generate_and_store_dashboard(&config, &database, &clock)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&dashboard).context("Failed to serialize dashboard")?
        );
    } else {
        println!("{}", render_markdown(&dashboard));
    }

    if let Dashboard::Ready(report) = &dashboard {
        println!("Dashboard generated: week of {}", report.current_week);
    }
    println!("- Markdown: {}", saved.markdown_path.display());
    println!("- JSON: {}", saved.json_path.display());

    Ok(())
}

fn handle_next(as_of: Option<String>) -> Result<()> {
    let config = load_or_default_config()?;
    let clock = resolve_clock(as_of)?;
    let schedule = analyzer::load_schedule(&config)?;

    match schedule.next_session(clock.today()) {
        Some(next) => {
            println!("{}", next.label);
            println!("{}", next.description);
        }
        None => println!("No upcoming session"),
    }

    Ok(())
}

fn handle_list(table: Table) -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;
    let rows = database.fetch_all(table)?;

    if rows.is_empty() {
        println!("No rows in {} yet.", table.name());
        return Ok(());
    }

    println!("{}", table.header().join("\t"));
    for row in &rows {
        let cells = table
            .header()
            .iter()
            .map(|column| row.get(*column).map(String::as_str).unwrap_or_default())
            .collect::<Vec<_>>();
        println!("{}", cells.join("\t"));
    }
    println!("{} row(s)", rows.len());

    Ok(())
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = load_config()?;
    let database = Database::open(&config.db_path)?;

    println!("SwimLog status");
    println!("- team: {}", config.team_name);
    println!("- db_path: {}", config.db_path.display());
    for table in Table::ALL {
        println!("- {}: {} row(s)", table.name(), database.count(table)?);
    }
    println!(
        "- latest_session_date: {}",
        database
            .latest_session_date()?
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing".to_string());
    }

    let config = load_or_default_config()?;

    match Database::open(&config.db_path) {
        Ok(database) => {
            println!("[OK] SQLite reachable: {}", config.db_path.display());
            match records::Logbook::load(&database) {
                Ok(logbook) => println!(
                    "[OK] all rows parse ({} sessions, {} targets, {} CSS tests)",
                    logbook.sessions.len(),
                    logbook.targets.len(),
                    logbook.css_tests.len()
                ),
                Err(error) => {
                    println!("[WARN] stored rows failed validation: {error}");
                    issues.push("invalid rows".to_string());
                }
            }
        }
        Err(error) => {
            println!("[WARN] SQLite check failed: {error}");
            issues.push("db unreachable".to_string());
        }
    }

    if config.report_dir.exists() {
        println!("[OK] report dir exists: {}", config.report_dir.display());
    } else {
        println!("[WARN] report dir missing: {}", config.report_dir.display());
        issues.push("report dir missing".to_string());
    }

    match analyzer::load_schedule(&config) {
        Ok(schedule) => {
            if schedule.next_session(SystemClock.today()).is_some() {
                println!("[OK] training schedule valid: {}", config.schedule_path.display());
            } else {
                println!("[WARN] training schedule has no training days");
                issues.push("empty schedule".to_string());
            }
        }
        Err(error) => {
            println!("[WARN] training schedule unreadable: {error:#}");
            issues.push("schedule unreadable".to_string());
        }
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

fn resolve_clock(as_of: Option<String>) -> Result<FixedClock> {
    match as_of.as_deref() {
        Some(raw) => Ok(FixedClock::at_date(parse_iso_date(raw)?)),
        None => Ok(FixedClock(SystemClock.now())),
    }
}

fn load_or_default_config() -> Result<Config> {
    let config = Config::load().or_else(|_| {
        let config = Config::default();
        config.save()?;
        Ok::<_, anyhow::Error>(config)
    })?;
    config.ensure_bootstrap_files()?;

    Ok(config)
}

fn load_config() -> Result<Config> {
    Config::load()
        .with_context(|| "Config file not found. Run `swimlog onboard` first.".to_string())
}
