use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_SCHEDULE_JSON: &str = include_str!("../../assets/schedule.json");

const REST_DAY_MARKER: &str = "no training";

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Fixed weekly plan. A day whose description contains "No training" (any
/// case) or is blank is a rest day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSchedule {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextSession {
    pub date: NaiveDate,
    /// e.g. `Fri 17-Oct`
    pub label: String,
    pub description: String,
}

impl TrainingSchedule {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schedule file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse schedule file: {}", path.display()))
    }

    pub fn description(&self, weekday: Weekday) -> &str {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn is_rest_day(&self, weekday: Weekday) -> bool {
        let description = self.description(weekday).trim();
        description.is_empty() || description.to_lowercase().contains(REST_DAY_MARKER)
    }

    /// First training day from `today` (inclusive) within one week. `None`
    /// when every day is a rest day.
    pub fn next_session(&self, today: NaiveDate) -> Option<NextSession> {
        (0..7)
            .map(|offset| today + Duration::days(offset))
            .find(|date| !self.is_rest_day(date.weekday()))
            .map(|date| NextSession {
                date,
                label: date.format("%a %d-%b").to_string(),
                description: rename_weekdays(self.description(date.weekday()), date),
            })
    }
}

fn rename_weekdays(description: &str, date: NaiveDate) -> String {
    let actual = date.format("%A").to_string();
    WEEKDAY_NAMES
        .iter()
        .fold(description.to_string(), |text, name| {
            text.replace(name, &actual)
        })
}
