use crate::analyzer::schedule::{DEFAULT_SCHEDULE_JSON, TrainingSchedule};
use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".swimlog";
const CONFIG_FILE: &str = "config.json";
const SCHEDULE_FILE: &str = "schedule.json";
const HOME_ENV: &str = "SWIMLOG_HOME";
const DEFAULT_TEAM_NAME: &str = "Team Bon Dia Mate";
pub const DEFAULT_RECENT_SESSIONS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub report_dir: PathBuf,
    pub schedule_path: PathBuf,
    pub api_port: u16,
    pub team_name: String,
    pub recent_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        let root = default_root_dir();

        Self {
            db_path: root.join("db").join("logbook.db"),
            report_dir: root.join("reports"),
            schedule_path: root.join(SCHEDULE_FILE),
            api_port: 7891,
            team_name: DEFAULT_TEAM_NAME.to_string(),
            recent_sessions: DEFAULT_RECENT_SESSIONS,
        }
    }
}

impl Config {
    pub fn root_dir() -> Result<PathBuf> {
        Ok(default_root_dir())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(&config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        let root = Self::root_dir()?;
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;

        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        fs::create_dir_all(&self.report_dir).with_context(|| {
            format!(
                "Failed to create report directory: {}",
                self.report_dir.display()
            )
        })?;

        if !self.schedule_path.exists() {
            if let Some(parent) = self.schedule_path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create schedule directory: {}", parent.display())
                })?;
            }
            fs::write(&self.schedule_path, DEFAULT_SCHEDULE_JSON).with_context(|| {
                format!(
                    "Failed to create default schedule file: {}",
                    self.schedule_path.display()
                )
            })?;
            set_mode_600(&self.schedule_path)?;
        }

        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let normalized = normalize_config_key(key);

        match normalized {
            "db_path" => {
                self.db_path = expand_home(value);
            }
            "report_dir" => {
                self.report_dir = expand_home(value);
            }
            "schedule_path" => {
                let path = expand_home(value);
                if path.exists() {
                    TrainingSchedule::load(&path)?;
                }
                self.schedule_path = path;
            }
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "team_name" => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    bail!("team_name must not be empty");
                }
                self.team_name = trimmed.to_string();
            }
            "recent_sessions" => {
                let parsed = value
                    .parse::<usize>()
                    .map_err(|_| anyhow!("recent_sessions must be a number"))?;
                if parsed == 0 {
                    bail!("recent_sessions must be at least 1");
                }
                self.recent_sessions = parsed;
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, report_dir|report.dir, schedule_path|schedule.path, api_port|api.port, team_name|team.name, recent_sessions|report.recent_sessions"
                );
            }
        }

        if normalized == "report_dir" {
            fs::create_dir_all(&self.report_dir).with_context(|| {
                format!(
                    "Failed to create report directory: {}",
                    self.report_dir.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "db_path" => Some(self.db_path.display().to_string()),
            "report_dir" => Some(self.report_dir.display().to_string()),
            "schedule_path" => Some(self.schedule_path.display().to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "team_name" => Some(self.team_name.clone()),
            "recent_sessions" => Some(self.recent_sessions.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "report_dir" | "report.dir" => "report_dir",
        "schedule_path" | "schedule.path" => "schedule_path",
        "api_port" | "api.port" => "api_port",
        "team_name" | "team.name" => "team_name",
        "recent_sessions" | "report.recent_sessions" => "recent_sessions",
        _ => key,
    }
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

fn default_root_dir() -> PathBuf {
    std::env::var(HOME_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| expand_home(&value))
        .unwrap_or_else(|| {
            home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        })
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}
