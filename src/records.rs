//! Typed records for the three logbook tables.
//!
//! Rows come back from the store as loosely typed text cells. Everything is
//! parsed here, on read, so a missing or mistyped cell turns into
//! `LogbookError::InvalidInput` at the boundary instead of deep inside the
//! aggregation code. Entry forms (CLI prompts, HTTP payloads) go through the
//! `*Input` types, which validate before anything is appended.

use crate::analyzer::css::css_pace;
use crate::db::{RecordStore, Row, Table};
use crate::error::{LogbookError, LogbookResult};
use chrono::{Datelike, NaiveDate, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Date format typed into the session form, e.g. `04-Nov-25`.
pub const SESSION_DATE_FORMAT: &str = "%d-%b-%y";
/// Storage and API format for every date cell.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Environment {
    #[value(name = "pool")]
    Pool,
    #[value(name = "open_water")]
    OpenWater,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Pool => "pool",
            Environment::OpenWater => "open_water",
        }
    }
}

impl FromStr for Environment {
    type Err = LogbookError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pool" => Ok(Environment::Pool),
            "open_water" | "open water" | "open-water" => Ok(Environment::OpenWater),
            other => Err(LogbookError::invalid(format!(
                "unknown environment: {other}. Expected pool or open_water"
            ))),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = LogbookError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The team roster. Sessions may only be logged for these swimmers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(try_from = "String")]
pub enum Swimmer {
    #[serde(rename = "BVH")]
    #[value(name = "BVH")]
    Bvh,
    #[serde(rename = "AVH")]
    #[value(name = "AVH")]
    Avh,
    #[serde(rename = "AA")]
    #[value(name = "AA")]
    Aa,
    #[serde(rename = "FGQ")]
    #[value(name = "FGQ")]
    Fgq,
}

impl Swimmer {
    pub const ROSTER: [Swimmer; 4] = [Swimmer::Bvh, Swimmer::Avh, Swimmer::Aa, Swimmer::Fgq];

    pub fn as_str(self) -> &'static str {
        match self {
            Swimmer::Bvh => "BVH",
            Swimmer::Avh => "AVH",
            Swimmer::Aa => "AA",
            Swimmer::Fgq => "FGQ",
        }
    }
}

impl fmt::Display for Swimmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Swimmer {
    type Err = LogbookError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        Swimmer::ROSTER
            .into_iter()
            .find(|swimmer| swimmer.as_str() == normalized)
            .ok_or_else(|| {
                LogbookError::invalid(format!(
                    "unknown swimmer: {value}. Expected one of BVH, AVH, AA, FGQ"
                ))
            })
    }
}

impl TryFrom<String> for Swimmer {
    type Error = LogbookError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub date: NaiveDate,
    pub environment: Environment,
    pub distance_m: u32,
    pub total_time_min: f64,
    pub moving_time_min: Option<f64>,
    pub rest_estimate_min: f64,
    pub sets_text: String,
    pub css_pace: Option<String>,
    pub avg_pace: Option<String>,
    pub rpe: u8,
    pub notes: String,
    pub team: String,
    pub swimmer: Swimmer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CssTest {
    pub date: NaiveDate,
    pub swimmer: String,
    pub time_200_s: f64,
    pub time_400_s: f64,
    pub css_s_per_100: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub week_start: NaiveDate,
    pub swimmer: String,
    pub km_target: f64,
}

impl Session {
    pub fn to_row(&self) -> Row {
        Row::from([
            cell_pair("date", format_iso(self.date)),
            cell_pair("environment", self.environment.as_str().to_string()),
            cell_pair("distance_m", self.distance_m.to_string()),
            cell_pair("total_time_min", self.total_time_min.to_string()),
            cell_pair(
                "moving_time_min",
                self.moving_time_min
                    .map(|value| value.to_string())
                    .unwrap_or_default(),
            ),
            cell_pair("rest_estimate_min", self.rest_estimate_min.to_string()),
            cell_pair("sets_text", self.sets_text.clone()),
            cell_pair("css_pace", self.css_pace.clone().unwrap_or_default()),
            cell_pair("avg_pace", self.avg_pace.clone().unwrap_or_default()),
            cell_pair("rpe", self.rpe.to_string()),
            cell_pair("notes", self.notes.clone()),
            cell_pair("team", self.team.clone()),
            cell_pair("swimmer", self.swimmer.as_str().to_string()),
        ])
    }

    pub fn from_row(row: &Row) -> LogbookResult<Self> {
        let session = Self {
            date: parse_iso_date(cell(row, "date")?)?,
            environment: cell(row, "environment")?.parse()?,
            distance_m: parse_number(row, "distance_m")?,
            total_time_min: parse_number(row, "total_time_min")?,
            moving_time_min: parse_optional_number(row, "moving_time_min")?
                .filter(|value: &f64| *value > 0.0),
            rest_estimate_min: parse_optional_number(row, "rest_estimate_min")?.unwrap_or(0.0),
            sets_text: cell(row, "sets_text")?.to_string(),
            css_pace: optional_text(row, "css_pace")?,
            avg_pace: optional_text(row, "avg_pace")?,
            rpe: parse_number(row, "rpe")?,
            notes: cell(row, "notes")?.to_string(),
            team: cell(row, "team")?.to_string(),
            swimmer: cell(row, "swimmer")?.parse()?,
        };
        session.validate()?;

        Ok(session)
    }

    pub fn validate(&self) -> LogbookResult<()> {
        if !(1..=10).contains(&self.rpe) {
            return Err(LogbookError::invalid(format!(
                "rpe must be between 1 and 10, got {}",
                self.rpe
            )));
        }
        ensure_non_negative("total_time_min", self.total_time_min)?;
        ensure_non_negative("rest_estimate_min", self.rest_estimate_min)?;
        if let Some(moving) = self.moving_time_min {
            ensure_non_negative("moving_time_min", moving)?;
        }

        Ok(())
    }
}

impl CssTest {
    pub fn new(
        date: NaiveDate,
        swimmer: &str,
        time_200_s: f64,
        time_400_s: f64,
    ) -> LogbookResult<Self> {
        Ok(Self {
            date,
            swimmer: swimmer.trim().to_string(),
            time_200_s,
            time_400_s,
            css_s_per_100: css_pace(time_200_s, time_400_s)?,
        })
    }

    pub fn to_row(&self) -> Row {
        Row::from([
            cell_pair("date", format_iso(self.date)),
            cell_pair("swimmer", self.swimmer.clone()),
            cell_pair("time_200_s", self.time_200_s.to_string()),
            cell_pair("time_400_s", self.time_400_s.to_string()),
            cell_pair("css_s_per_100", self.css_s_per_100.to_string()),
        ])
    }

    pub fn from_row(row: &Row) -> LogbookResult<Self> {
        let time_200_s = parse_number(row, "time_200_s")?;
        let time_400_s = parse_number(row, "time_400_s")?;
        css_pace(time_200_s, time_400_s)?;

        Ok(Self {
            date: parse_iso_date(cell(row, "date")?)?,
            swimmer: cell(row, "swimmer")?.to_string(),
            time_200_s,
            time_400_s,
            css_s_per_100: parse_number(row, "css_s_per_100")?,
        })
    }
}

impl Target {
    pub fn new(week_start: NaiveDate, swimmer: &str, km_target: f64) -> LogbookResult<Self> {
        ensure_non_negative("km_target", km_target)?;
        if week_start.weekday() != Weekday::Mon {
            warn!(
                week_start = %week_start,
                weekday = %week_start.weekday(),
                "target week_start is not a Monday"
            );
        }

        Ok(Self {
            week_start,
            swimmer: swimmer.trim().to_string(),
            km_target,
        })
    }

    pub fn to_row(&self) -> Row {
        Row::from([
            cell_pair("week_start", format_iso(self.week_start)),
            cell_pair("swimmer", self.swimmer.clone()),
            cell_pair("km_target", self.km_target.to_string()),
        ])
    }

    pub fn from_row(row: &Row) -> LogbookResult<Self> {
        let km_target = parse_number(row, "km_target")?;
        ensure_non_negative("km_target", km_target)?;

        Ok(Self {
            week_start: parse_iso_date(cell(row, "week_start")?)?,
            swimmer: cell(row, "swimmer")?.to_string(),
            km_target,
        })
    }
}

/// Session form as submitted. Optional numbers default the way the form did.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInput {
    /// `dd-mmm-yy`; today when absent.
    pub date: Option<String>,
    pub environment: Environment,
    pub distance_m: u32,
    pub total_time_min: f64,
    #[serde(default)]
    pub moving_time_min: f64,
    #[serde(default)]
    pub rest_estimate_min: f64,
    #[serde(default)]
    pub sets_text: String,
    #[serde(default)]
    pub css_pace: String,
    #[serde(default)]
    pub avg_pace: String,
    pub rpe: u8,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub team: String,
    pub swimmer: Swimmer,
}

impl SessionInput {
    pub fn into_session(self, today: NaiveDate) -> LogbookResult<Session> {
        let date = match self.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_session_date(raw)?,
            _ => today,
        };

        let session = Session {
            date,
            environment: self.environment,
            distance_m: self.distance_m,
            total_time_min: self.total_time_min,
            moving_time_min: (self.moving_time_min > 0.0).then_some(self.moving_time_min),
            rest_estimate_min: self.rest_estimate_min,
            sets_text: self.sets_text,
            css_pace: non_empty(self.css_pace),
            avg_pace: non_empty(self.avg_pace),
            rpe: self.rpe,
            notes: self.notes,
            team: self.team,
            swimmer: self.swimmer,
        };
        session.validate()?;

        Ok(session)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CssTestInput {
    /// ISO date; today when absent.
    pub date: Option<String>,
    pub swimmer: String,
    pub time_200_s: f64,
    pub time_400_s: f64,
}

impl CssTestInput {
    pub fn into_css_test(self, today: NaiveDate) -> LogbookResult<CssTest> {
        let date = parse_optional_iso_date(self.date.as_deref(), today)?;
        CssTest::new(date, &self.swimmer, self.time_200_s, self.time_400_s)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetInput {
    /// ISO date; today when absent.
    pub week_start: Option<String>,
    pub swimmer: String,
    pub km_target: f64,
}

impl TargetInput {
    pub fn into_target(self, today: NaiveDate) -> LogbookResult<Target> {
        let week_start = parse_optional_iso_date(self.week_start.as_deref(), today)?;
        Target::new(week_start, &self.swimmer, self.km_target)
    }
}

/// Everything the dashboard needs, read once per render.
#[derive(Debug, Clone, Default)]
pub struct Logbook {
    pub sessions: Vec<Session>,
    pub css_tests: Vec<CssTest>,
    pub targets: Vec<Target>,
}

impl Logbook {
    pub fn load(store: &impl RecordStore) -> LogbookResult<Self> {
        Ok(Self {
            sessions: load_sessions(store)?,
            css_tests: load_css_tests(store)?,
            targets: load_targets(store)?,
        })
    }
}

pub fn load_sessions(store: &impl RecordStore) -> LogbookResult<Vec<Session>> {
    parse_table(store, Table::Sessions, Session::from_row)
}

pub fn load_css_tests(store: &impl RecordStore) -> LogbookResult<Vec<CssTest>> {
    parse_table(store, Table::CssTests, CssTest::from_row)
}

pub fn load_targets(store: &impl RecordStore) -> LogbookResult<Vec<Target>> {
    parse_table(store, Table::Targets, Target::from_row)
}

pub fn save_session(store: &mut impl RecordStore, session: &Session) -> LogbookResult<()> {
    store.append(Table::Sessions, &session.to_row())?;
    info!(
        swimmer = %session.swimmer,
        date = %session.date,
        distance_m = session.distance_m,
        "session logged"
    );
    Ok(())
}

pub fn save_css_test(store: &mut impl RecordStore, test: &CssTest) -> LogbookResult<()> {
    store.append(Table::CssTests, &test.to_row())?;
    info!(
        swimmer = %test.swimmer,
        css_s_per_100 = test.css_s_per_100,
        "css test saved"
    );
    Ok(())
}

pub fn save_target(store: &mut impl RecordStore, target: &Target) -> LogbookResult<()> {
    store.append(Table::Targets, &target.to_row())?;
    info!(
        swimmer = %target.swimmer,
        week_start = %target.week_start,
        km_target = target.km_target,
        "target set"
    );
    Ok(())
}

pub fn parse_session_date(input: &str) -> LogbookResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), SESSION_DATE_FORMAT).map_err(|_| {
        LogbookError::invalid("Invalid date format. Please use dd-mmm-yy (e.g., 04-Nov-25)")
    })
}

pub fn parse_iso_date(input: &str) -> LogbookResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), ISO_DATE_FORMAT).map_err(|_| {
        LogbookError::invalid(format!("Invalid date format: {input}. Example: 2025-11-03"))
    })
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

fn parse_optional_iso_date(input: Option<&str>, today: NaiveDate) -> LogbookResult<NaiveDate> {
    match input.map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_iso_date(raw),
        _ => Ok(today),
    }
}

fn parse_table<T>(
    store: &impl RecordStore,
    table: Table,
    parse: impl Fn(&Row) -> LogbookResult<T>,
) -> LogbookResult<Vec<T>> {
    store
        .fetch_all(table)?
        .iter()
        .enumerate()
        .map(|(index, row)| {
            parse(row).map_err(|error| match error {
                LogbookError::InvalidInput(message) => LogbookError::invalid(format!(
                    "{} row {}: {message}",
                    table.name(),
                    index + 1
                )),
                other => other,
            })
        })
        .collect()
}

fn cell<'a>(row: &'a Row, column: &str) -> LogbookResult<&'a str> {
    row.get(column)
        .map(|value| value.trim())
        .ok_or_else(|| LogbookError::invalid(format!("missing column: {column}")))
}

fn parse_number<T: FromStr>(row: &Row, column: &str) -> LogbookResult<T> {
    let raw = cell(row, column)?;
    raw.parse::<T>()
        .map_err(|_| LogbookError::invalid(format!("{column} is not a valid number: {raw:?}")))
}

fn parse_optional_number(row: &Row, column: &str) -> LogbookResult<Option<f64>> {
    match cell(row, column)? {
        "" => Ok(None),
        _ => parse_number(row, column).map(Some),
    }
}

fn optional_text(row: &Row, column: &str) -> LogbookResult<Option<String>> {
    Ok(non_empty(cell(row, column)?.to_string()))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn ensure_non_negative(field: &str, value: f64) -> LogbookResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LogbookError::invalid(format!(
            "{field} must be a non-negative number, got {value}"
        )))
    }
}

fn cell_pair(column: &str, value: String) -> (String, String) {
    (column.to_string(), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn form() -> SessionInput {
        SessionInput {
            date: Some("04-Nov-25".to_string()),
            environment: Environment::Pool,
            distance_m: 2500,
            total_time_min: 55.0,
            moving_time_min: 0.0,
            rest_estimate_min: 6.5,
            sets_text: "8x100 @1:50".to_string(),
            css_pace: String::new(),
            avg_pace: "1:52".to_string(),
            rpe: 6,
            notes: String::new(),
            team: "Bon Dia Mate".to_string(),
            swimmer: Swimmer::Aa,
        }
    }

    #[test]
    fn session_form_parses_short_month_date() {
        let session = form().into_session(date(2030, 1, 1)).expect("session");
        assert_eq!(session.date, date(2025, 11, 4));
        assert_eq!(session.moving_time_min, None);
        assert_eq!(session.css_pace, None);
        assert_eq!(session.avg_pace.as_deref(), Some("1:52"));
    }

    #[test]
    fn session_form_defaults_to_today() {
        let input = SessionInput {
            date: None,
            ..form()
        };
        let session = input.into_session(date(2025, 11, 7)).expect("session");
        assert_eq!(session.date, date(2025, 11, 7));
    }

    #[test]
    fn session_form_rejects_iso_date() {
        let input = SessionInput {
            date: Some("2025-11-04".to_string()),
            ..form()
        };
        let error = input.into_session(date(2025, 11, 7)).expect_err("rejected");
        assert!(error.is_invalid_input());
        assert!(error.to_string().contains("dd-mmm-yy"));
    }

    #[test]
    fn session_form_rejects_rpe_out_of_range() {
        let input = SessionInput { rpe: 11, ..form() };
        assert!(input.into_session(date(2025, 11, 7)).is_err());
        let input = SessionInput { rpe: 0, ..form() };
        assert!(input.into_session(date(2025, 11, 7)).is_err());
    }

    #[test]
    fn session_survives_the_store() {
        let mut store = MemoryStore::default();
        let session = SessionInput {
            moving_time_min: 48.5,
            ..form()
        }
        .into_session(date(2025, 11, 7))
        .expect("session");

        save_session(&mut store, &session).expect("save");
        let loaded = load_sessions(&store).expect("load");

        assert_eq!(loaded, vec![session]);
    }

    #[test]
    fn mistyped_cell_is_invalid_input_with_row_number() {
        let mut store = MemoryStore::default();
        let session = form().into_session(date(2025, 11, 7)).expect("session");
        save_session(&mut store, &session).expect("save");

        let mut broken = session.to_row();
        broken.insert("distance_m".to_string(), "two km".to_string());
        store.append(Table::Sessions, &broken).expect("append");

        let error = load_sessions(&store).expect_err("broken row");
        assert!(error.is_invalid_input());
        assert!(error.to_string().contains("Sessions row 2"));
        assert!(error.to_string().contains("distance_m"));
    }

    #[test]
    fn missing_column_is_invalid_input() {
        let row = Row::from([("swimmer".to_string(), "AA".to_string())]);
        let error = Target::from_row(&row).expect_err("missing week_start");
        assert!(error.to_string().contains("missing column: week_start"));
    }

    #[test]
    fn stored_css_test_with_zero_time_is_invalid() {
        let mut store = MemoryStore::default();
        let test = CssTest::new(date(2025, 11, 2), "AA", 60.0, 130.0).expect("css");
        let mut broken = test.to_row();
        broken.insert("time_200_s".to_string(), "0".to_string());
        store.append(Table::CssTests, &broken).expect("append");

        let error = load_css_tests(&store).expect_err("zero time");
        assert!(error.is_invalid_input());
        assert!(error.to_string().contains("CSSTests row 1"));
    }

    #[test]
    fn stored_negative_target_is_invalid() {
        let mut store = MemoryStore::default();
        let target = Target::new(date(2025, 11, 3), "AA", 10.0).expect("target");
        let mut broken = target.to_row();
        broken.insert("km_target".to_string(), "-3".to_string());
        store.append(Table::Targets, &broken).expect("append");

        let error = load_targets(&store).expect_err("negative km");
        assert!(error.to_string().contains("km_target"));
    }

    #[test]
    fn session_payload_accepts_any_case_roster_names() {
        let input: SessionInput = serde_json::from_value(serde_json::json!({
            "environment": "Open Water",
            "distance_m": 1500,
            "total_time_min": 35.0,
            "rpe": 6,
            "swimmer": "aa"
        }))
        .expect("payload");
        assert_eq!(input.swimmer, Swimmer::Aa);
        assert_eq!(input.environment, Environment::OpenWater);

        let error = serde_json::from_value::<SessionInput>(serde_json::json!({
            "environment": "lake",
            "distance_m": 1500,
            "total_time_min": 35.0,
            "rpe": 6,
            "swimmer": "AA"
        }))
        .expect_err("unknown environment");
        assert!(error.to_string().contains("unknown environment: lake"));
    }

    #[test]
    fn unknown_swimmer_is_rejected() {
        assert!("xyz".parse::<Swimmer>().is_err());
        assert_eq!(" bvh ".parse::<Swimmer>().expect("roster"), Swimmer::Bvh);
    }

    #[test]
    fn css_test_input_computes_pace() {
        let input = CssTestInput {
            date: Some("2025-11-02".to_string()),
            swimmer: " BVH ".to_string(),
            time_200_s: 60.0,
            time_400_s: 130.0,
        };
        let test = input.into_css_test(date(2025, 11, 7)).expect("css test");
        assert_eq!(test.swimmer, "BVH");
        assert_eq!(test.css_s_per_100, 35.0);
    }

    #[test]
    fn target_rejects_negative_km() {
        let input = TargetInput {
            week_start: None,
            swimmer: "AA".to_string(),
            km_target: -1.0,
        };
        assert!(input.into_target(date(2025, 11, 3)).is_err());
    }

    #[test]
    fn duplicate_targets_are_all_retained() {
        let mut store = MemoryStore::default();
        let monday = date(2025, 11, 3);
        save_target(&mut store, &Target::new(monday, "AA", 10.0).expect("t")).expect("save");
        save_target(&mut store, &Target::new(monday, "AA", 12.0).expect("t")).expect("save");

        let targets = load_targets(&store).expect("load");
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].km_target, 12.0);
    }
}
