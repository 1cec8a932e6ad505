pub mod forms;
pub mod onboard;

use crate::db::Table;
use crate::records::{Environment, Swimmer};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "swimlog",
    about = "Swim training logbook: sessions, CSS tests, weekly targets and training load"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive first-run setup
    Onboard,
    /// Log a swim session
    Log(LogArgs),
    /// Record a CSS test (200m + 400m time trial)
    Css(CssArgs),
    /// Set a weekly distance target
    Target(TargetArgs),
    /// Render the weekly dashboard report
    Dashboard {
        /// Render as of this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        as_of: Option<String>,
        /// Print the JSON report to stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show the next scheduled training session
    Next {
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Print every row of a table in append order
    List {
        #[arg(value_enum)]
        table: Table,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
    Doctor,
    /// Serve the JSON API on localhost
    Serve,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Session date, dd-mmm-yy (e.g. 04-Nov-25); defaults to today
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long, value_enum)]
    pub environment: Option<Environment>,
    #[arg(long = "distance", value_name = "METERS")]
    pub distance_m: Option<u32>,
    #[arg(long = "total-time", value_name = "MIN")]
    pub total_time_min: Option<f64>,
    #[arg(long = "moving-time", value_name = "MIN")]
    pub moving_time_min: Option<f64>,
    #[arg(long = "rest", value_name = "MIN")]
    pub rest_estimate_min: Option<f64>,
    #[arg(long = "sets")]
    pub sets_text: Option<String>,
    #[arg(long)]
    pub css_pace: Option<String>,
    #[arg(long)]
    pub avg_pace: Option<String>,
    #[arg(long)]
    pub rpe: Option<u8>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub team: Option<String>,
    #[arg(long, value_enum)]
    pub swimmer: Option<Swimmer>,
    /// Fail instead of prompting for missing fields
    #[arg(long, default_value_t = false)]
    pub no_input: bool,
}

#[derive(Debug, Args)]
pub struct CssArgs {
    /// Test date, YYYY-MM-DD; defaults to today
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub swimmer: Option<String>,
    #[arg(long = "t200", value_name = "SECONDS")]
    pub time_200_s: Option<f64>,
    #[arg(long = "t400", value_name = "SECONDS")]
    pub time_400_s: Option<f64>,
    #[arg(long, default_value_t = false)]
    pub no_input: bool,
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Week start (a Monday), YYYY-MM-DD; defaults to today
    #[arg(long)]
    pub week_start: Option<String>,
    #[arg(long)]
    pub swimmer: Option<String>,
    #[arg(long = "km")]
    pub km_target: Option<f64>,
    #[arg(long, default_value_t = false)]
    pub no_input: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}
