use crate::analyzer::css::format_pace;
use crate::analyzer::load::{
    WeeklyLoad, WeeklyLoads, aggregate_weekly, current_week, previous_week, week_rows, week_start,
};
use crate::analyzer::schedule::{NextSession, TrainingSchedule};
use crate::clock::Clock;
use crate::records::{CssTest, Logbook, Session, Swimmer, format_iso};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

const NO_SESSIONS: &str = "No sessions logged yet.";
const BAR_WIDTH: usize = 30;
const GENERATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub title: String,
    pub recent_sessions: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Dashboard {
    Empty {
        title: String,
        message: String,
        next_session: Option<NextSession>,
    },
    Ready(DashboardReport),
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub title: String,
    pub generated_at: String,
    pub as_of: String,
    pub current_week: String,
    pub last_week: String,
    pub this_week_km: Vec<SwimmerKm>,
    pub last_week_km: Vec<SwimmerKm>,
    pub next_session: Option<NextSession>,
    pub weekly_distance: Vec<WeekDistance>,
    pub training_load: Vec<LoadRow>,
    pub recent_sessions: Vec<Session>,
    pub target_progress: Vec<TargetProgress>,
    pub latest_css: Vec<CssTest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwimmerKm {
    pub swimmer: Swimmer,
    pub km: f64,
    /// Share of the week's total, in percent.
    pub share: f64,
}

/// One pivot row: every swimmer seen in any week, 0 when absent.
#[derive(Debug, Clone, Serialize)]
pub struct WeekDistance {
    pub week: String,
    pub km_by_swimmer: BTreeMap<Swimmer, f64>,
    pub total_km: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadRow {
    pub week: String,
    pub swimmer: Swimmer,
    #[serde(flatten)]
    pub load: WeeklyLoad,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetProgress {
    pub swimmer: String,
    pub km_target: f64,
    pub km_done: f64,
    pub percent: Option<f64>,
}

#[derive(Debug)]
pub struct SavedReport {
    pub markdown_path: PathBuf,
    pub json_path: PathBuf,
}

/// Reports are named after the week they cover.
pub fn report_stem(clock: &impl Clock) -> String {
    format_iso(current_week(clock))
}

pub fn build_dashboard(
    logbook: &Logbook,
    schedule: &TrainingSchedule,
    clock: &impl Clock,
    options: &DashboardOptions,
) -> Dashboard {
    let today = clock.today();
    let next_session = schedule.next_session(today);

    if logbook.sessions.is_empty() {
        return Dashboard::Empty {
            title: options.title.clone(),
            message: NO_SESSIONS.to_string(),
            next_session,
        };
    }

    let loads = aggregate_weekly(&logbook.sessions);
    let current = current_week(clock);
    let last = previous_week(current);

    let this_week_km = swimmer_km(&loads, current);

    Dashboard::Ready(DashboardReport {
        title: options.title.clone(),
        generated_at: clock.now().format(GENERATED_AT_FORMAT).to_string(),
        as_of: format_iso(today),
        current_week: format_iso(current),
        last_week: format_iso(last),
        target_progress: target_progress(logbook, current, &this_week_km),
        this_week_km,
        last_week_km: swimmer_km(&loads, last),
        next_session,
        weekly_distance: weekly_distance(&loads),
        training_load: loads
            .iter()
            .map(|(key, load)| LoadRow {
                week: format_iso(key.week),
                swimmer: key.swimmer,
                load: *load,
            })
            .collect(),
        recent_sessions: recent_sessions(&logbook.sessions, options.recent_sessions),
        latest_css: latest_css(&logbook.css_tests),
    })
}

fn swimmer_km(loads: &WeeklyLoads, week: NaiveDate) -> Vec<SwimmerKm> {
    let rows = week_rows(loads, week);
    let total = rows.iter().map(|(_, load)| load.total_distance_km).sum::<f64>();

    rows.into_iter()
        .map(|(swimmer, load)| SwimmerKm {
            swimmer,
            km: load.total_distance_km,
            share: if total > 0.0 {
                load.total_distance_km / total * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

fn weekly_distance(loads: &WeeklyLoads) -> Vec<WeekDistance> {
    let swimmers = loads.keys().map(|key| key.swimmer).collect::<BTreeSet<_>>();
    let weeks = loads.keys().map(|key| key.week).collect::<BTreeSet<_>>();

    weeks
        .into_iter()
        .map(|week| {
            let km_by_swimmer = swimmers
                .iter()
                .map(|swimmer| {
                    let km = week_rows(loads, week)
                        .into_iter()
                        .find(|(candidate, _)| candidate == swimmer)
                        .map(|(_, load)| load.total_distance_km)
                        .unwrap_or_default();
                    (*swimmer, km)
                })
                .collect::<BTreeMap<_, _>>();

            WeekDistance {
                week: format_iso(week),
                total_km: km_by_swimmer.values().sum(),
                km_by_swimmer,
            }
        })
        .collect()
}

/// Newest first; sessions on the same date keep newest-appended first.
fn recent_sessions(sessions: &[Session], limit: usize) -> Vec<Session> {
    let mut ordered = sessions.iter().rev().cloned().collect::<Vec<_>>();
    ordered.sort_by(|left, right| right.date.cmp(&left.date));
    ordered.into_iter().take(limit).collect()
}

/// Latest appended target per swimmer for the current week.
fn target_progress(
    logbook: &Logbook,
    current: NaiveDate,
    this_week_km: &[SwimmerKm],
) -> Vec<TargetProgress> {
    logbook
        .targets
        .iter()
        .filter(|target| week_start(target.week_start) == current)
        .fold(BTreeMap::new(), |mut acc, target| {
            acc.insert(target.swimmer.to_uppercase(), target);
            acc
        })
        .into_values()
        .map(|target| {
            let km_done = this_week_km
                .iter()
                .find(|entry| entry.swimmer.as_str().eq_ignore_ascii_case(&target.swimmer))
                .map(|entry| entry.km)
                .unwrap_or_default();

            TargetProgress {
                swimmer: target.swimmer.clone(),
                km_target: target.km_target,
                km_done,
                percent: (target.km_target > 0.0).then(|| km_done / target.km_target * 100.0),
            }
        })
        .collect()
}

/// Most recent test per swimmer; ties on date go to the later append.
fn latest_css(tests: &[CssTest]) -> Vec<CssTest> {
    tests
        .iter()
        .fold(BTreeMap::<String, &CssTest>::new(), |mut acc, test| {
            let key = test.swimmer.to_uppercase();
            let newer = acc
                .get(&key)
                .is_none_or(|existing| test.date >= existing.date);
            if newer {
                acc.insert(key, test);
            }
            acc
        })
        .into_values()
        .cloned()
        .collect()
}

pub fn render_markdown(dashboard: &Dashboard) -> String {
    match dashboard {
        Dashboard::Empty {
            title,
            message,
            next_session,
        } => format!(
            "# {title} - Dashboard\n\n{message}\n\n## Next Training Session\n{}\n",
            render_next_session(next_session.as_ref())
        ),
        Dashboard::Ready(report) => render_report(report),
    }
}

fn render_report(report: &DashboardReport) -> String {
    let this_week = if report.this_week_km.is_empty() {
        "No data for this week yet.".to_string()
    } else {
        render_km_bars(&report.this_week_km)
    };
    let last_week = if report.last_week_km.is_empty() {
        "No data for last week.".to_string()
    } else {
        render_km_bars(&report.last_week_km)
    };

    format!(
        "# {} - Dashboard\n\nAs of {} (week of {})\n\n## This Week's KM by Swimmer\n{}\n\n## Last Week's KM by Swimmer ({})\n{}\n\n## Next Training Session\n{}\n\n## Weekly Targets\n{}\n\n## Weekly Distance by Swimmer\n{}\n\n## Training Load\n{}\n\n## Latest CSS\n{}\n\n## Last {} Sessions\n{}\n",
        report.title,
        report.as_of,
        report.current_week,
        this_week,
        report.last_week,
        last_week,
        render_next_session(report.next_session.as_ref()),
        render_targets(&report.target_progress),
        render_weekly_distance(&report.weekly_distance),
        render_training_load(&report.training_load),
        render_css(&report.latest_css),
        report.recent_sessions.len(),
        render_sessions(&report.recent_sessions),
    )
}

fn render_next_session(next: Option<&NextSession>) -> String {
    next.map(|session| format!("{}\n{}", session.label, session.description))
        .unwrap_or_else(|| "No upcoming session".to_string())
}

fn render_km_bars(rows: &[SwimmerKm]) -> String {
    let max = rows.iter().map(|row| row.km).fold(0.0_f64, f64::max);

    let lines = rows
        .iter()
        .map(|row| {
            format!(
                "{:<4} {:<width$} {:.1}km ({:.0}%)",
                row.swimmer.as_str(),
                bar(row.km, max),
                row.km,
                row.share,
                width = BAR_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("```\n{lines}\n```")
}

fn render_targets(progress: &[TargetProgress]) -> String {
    if progress.is_empty() {
        return "- No targets set for this week".to_string();
    }

    let rows = progress
        .iter()
        .map(|entry| {
            format!(
                "| {} | {:.1} | {:.1} | {} |",
                entry.swimmer,
                entry.km_target,
                entry.km_done,
                entry
                    .percent
                    .map(|percent| format!("{percent:.0}%"))
                    .unwrap_or_else(|| "-".to_string())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("| Swimmer | Target (km) | Done (km) | Progress |\n|---------|-------------|-----------|----------|\n{rows}")
}

fn render_weekly_distance(rows: &[WeekDistance]) -> String {
    let swimmers = rows
        .first()
        .map(|row| row.km_by_swimmer.keys().copied().collect::<Vec<_>>())
        .unwrap_or_default();

    let header = swimmers
        .iter()
        .map(|swimmer| format!(" {} |", swimmer.as_str()))
        .collect::<String>();
    let divider = swimmers.iter().map(|_| "------|").collect::<String>();
    let body = rows
        .iter()
        .map(|row| {
            let cells = swimmers
                .iter()
                .map(|swimmer| {
                    format!(
                        " {:.1} |",
                        row.km_by_swimmer.get(swimmer).copied().unwrap_or_default()
                    )
                })
                .collect::<String>();
            format!("| {} |{} {:.1} |", row.week, cells, row.total_km)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("| Week |{header} Total |\n|------|{divider}-------|\n{body}")
}

fn render_training_load(rows: &[LoadRow]) -> String {
    let body = rows
        .iter()
        .map(|row| {
            format!(
                "| {} | {} | {:.1} | {:.1} | {:.2} | {:.2} | {:.2} | {:.1} |",
                row.week,
                row.swimmer.as_str(),
                row.load.total_distance_km,
                row.load.total_load,
                row.load.mean_rpe,
                row.load.std_rpe,
                row.load.monotony,
                row.load.strain
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "| Week | Swimmer | KM | Load | Mean RPE | Std RPE | Monotony | Strain |\n|------|---------|----|------|----------|---------|----------|--------|\n{body}"
    )
}

fn render_css(tests: &[CssTest]) -> String {
    if tests.is_empty() {
        return "- No CSS tests recorded".to_string();
    }

    tests
        .iter()
        .map(|test| {
            format!(
                "- {}: {:.2} s/100m ({}/100m) on {}",
                test.swimmer,
                test.css_s_per_100,
                format_pace(test.css_s_per_100),
                format_iso(test.date)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_sessions(sessions: &[Session]) -> String {
    let body = sessions
        .iter()
        .map(|session| {
            format!(
                "| {} | {} | {} | {} | {:.1} | {} | {} |",
                format_iso(session.date),
                session.swimmer.as_str(),
                session.environment.as_str(),
                session.distance_m,
                session.total_time_min,
                session.rpe,
                session.sets_text.replace('|', "/").replace('\n', " ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "| Date | Swimmer | Env | Distance (m) | Time (min) | RPE | Sets |\n|------|---------|-----|--------------|------------|-----|------|\n{body}"
    )
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled.min(BAR_WIDTH))
}

pub fn save_report_files(
    dashboard: &Dashboard,
    stem: &str,
    report_dir: &Path,
) -> Result<SavedReport> {
    fs::create_dir_all(report_dir).with_context(|| {
        format!(
            "Failed to create report directory: {}",
            report_dir.display()
        )
    })?;

    let markdown_path = report_dir.join(format!("{stem}.md"));
    let json_path = report_dir.join(format!("{stem}.json"));

    fs::write(&markdown_path, render_markdown(dashboard)).with_context(|| {
        format!(
            "Failed to write Markdown report: {}",
            markdown_path.display()
        )
    })?;

    let json_content =
        serde_json::to_string_pretty(dashboard).context("Failed to serialize dashboard JSON")?;
    fs::write(&json_path, json_content)
        .with_context(|| format!("Failed to write JSON report: {}", json_path.display()))?;

    Ok(SavedReport {
        markdown_path,
        json_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::schedule::DEFAULT_SCHEDULE_JSON;
    use crate::clock::FixedClock;
    use crate::records::{Environment, Target};
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn session(on: NaiveDate, swimmer: Swimmer, distance_m: u32, rpe: u8) -> Session {
        Session {
            date: on,
            environment: Environment::OpenWater,
            distance_m,
            total_time_min: 40.0,
            moving_time_min: None,
            rest_estimate_min: 2.0,
            sets_text: "steady".to_string(),
            css_pace: None,
            avg_pace: None,
            rpe,
            notes: String::new(),
            team: String::new(),
            swimmer,
        }
    }

    fn options() -> DashboardOptions {
        DashboardOptions {
            title: "Team Bon Dia Mate".to_string(),
            recent_sessions: 10,
        }
    }

    fn schedule() -> TrainingSchedule {
        serde_json::from_str(DEFAULT_SCHEDULE_JSON).expect("schedule")
    }

    fn ready(dashboard: Dashboard) -> DashboardReport {
        match dashboard {
            Dashboard::Ready(report) => report,
            Dashboard::Empty { .. } => panic!("expected a report"),
        }
    }

    fn sample_logbook() -> Logbook {
        Logbook {
            sessions: vec![
                session(date(2025, 10, 28), Swimmer::Aa, 2000, 5),
                session(date(2025, 10, 30), Swimmer::Bvh, 1000, 4),
                session(date(2025, 11, 3), Swimmer::Aa, 1000, 4),
                session(date(2025, 11, 5), Swimmer::Aa, 2000, 6),
                session(date(2025, 11, 5), Swimmer::Fgq, 1500, 7),
            ],
            css_tests: vec![
                CssTest::new(date(2025, 9, 1), "AA", 180.0, 380.0).expect("css"),
                CssTest::new(date(2025, 10, 1), "aa", 175.0, 365.0).expect("css"),
                CssTest::new(date(2025, 10, 1), "BVH", 60.0, 130.0).expect("css"),
            ],
            targets: vec![
                Target::new(date(2025, 11, 3), "AA", 5.0).expect("target"),
                Target::new(date(2025, 11, 3), "AA", 6.0).expect("target"),
                Target::new(date(2025, 10, 27), "FGQ", 3.0).expect("target"),
            ],
        }
    }

    #[test]
    fn empty_logbook_is_an_explicit_no_data_result() {
        let clock = FixedClock::at_date(date(2025, 11, 6));
        let dashboard = build_dashboard(&Logbook::default(), &schedule(), &clock, &options());

        match &dashboard {
            Dashboard::Empty { message, next_session, .. } => {
                assert_eq!(message, "No sessions logged yet.");
                assert_eq!(next_session.as_ref().map(|s| s.date), Some(date(2025, 11, 7)));
            }
            Dashboard::Ready(_) => panic!("expected empty dashboard"),
        }
        assert!(render_markdown(&dashboard).contains("No sessions logged yet."));
    }

    #[test]
    fn current_and_last_week_split() {
        let clock = FixedClock::at_date(date(2025, 11, 6));
        let report = ready(build_dashboard(&sample_logbook(), &schedule(), &clock, &options()));

        assert_eq!(report.generated_at, "2025-11-06T12:00:00");
        assert_eq!(report.current_week, "2025-11-03");
        assert_eq!(report.last_week, "2025-10-27");

        let this_week = report
            .this_week_km
            .iter()
            .map(|entry| (entry.swimmer, entry.km))
            .collect::<Vec<_>>();
        assert_eq!(this_week, vec![(Swimmer::Aa, 3.0), (Swimmer::Fgq, 1.5)]);

        let last_week_share = report
            .last_week_km
            .iter()
            .map(|entry| entry.share.round() as i64)
            .collect::<Vec<_>>();
        assert_eq!(last_week_share, vec![33, 67]);
    }

    #[test]
    fn pivot_fills_missing_swimmers_with_zero() {
        let clock = FixedClock::at_date(date(2025, 11, 6));
        let report = ready(build_dashboard(&sample_logbook(), &schedule(), &clock, &options()));

        assert_eq!(report.weekly_distance.len(), 2);
        let first = &report.weekly_distance[0];
        assert_eq!(first.week, "2025-10-27");
        assert_eq!(first.km_by_swimmer[&Swimmer::Fgq], 0.0);
        assert_eq!(first.total_km, 3.0);
        assert_eq!(report.training_load.len(), 4);
    }

    #[test]
    fn latest_target_per_swimmer_wins_for_the_current_week() {
        let clock = FixedClock::at_date(date(2025, 11, 6));
        let report = ready(build_dashboard(&sample_logbook(), &schedule(), &clock, &options()));

        assert_eq!(report.target_progress.len(), 1);
        let progress = &report.target_progress[0];
        assert_eq!(progress.km_target, 6.0);
        assert_eq!(progress.km_done, 3.0);
        assert_eq!(progress.percent, Some(50.0));
    }

    #[test]
    fn latest_css_per_swimmer() {
        let clock = FixedClock::at_date(date(2025, 11, 6));
        let report = ready(build_dashboard(&sample_logbook(), &schedule(), &clock, &options()));

        let paces = report
            .latest_css
            .iter()
            .map(|test| test.css_s_per_100)
            .collect::<Vec<_>>();
        assert_eq!(paces, vec![95.0, 35.0]);
    }

    #[test]
    fn recent_sessions_newest_first_and_limited() {
        let clock = FixedClock::at_date(date(2025, 11, 6));
        let limited = DashboardOptions {
            recent_sessions: 3,
            ..options()
        };
        let report = ready(build_dashboard(&sample_logbook(), &schedule(), &clock, &limited));

        let order = report
            .recent_sessions
            .iter()
            .map(|session| (session.date, session.swimmer))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                (date(2025, 11, 5), Swimmer::Fgq),
                (date(2025, 11, 5), Swimmer::Aa),
                (date(2025, 11, 3), Swimmer::Aa),
            ]
        );
    }

    #[test]
    fn quiet_current_week_still_renders() {
        let clock = FixedClock::at_date(date(2025, 12, 1));
        let dashboard = build_dashboard(&sample_logbook(), &schedule(), &clock, &options());
        let markdown = render_markdown(&dashboard);

        assert!(markdown.contains("No data for this week yet."));
        assert!(markdown.contains("No data for last week."));
        assert!(markdown.contains("Mon 01-Dec"));
    }

    #[test]
    fn report_files_are_written() {
        let dir = tempdir().expect("tempdir");
        let clock = FixedClock::at_date(date(2025, 11, 6));
        let dashboard = build_dashboard(&sample_logbook(), &schedule(), &clock, &options());

        let saved = save_report_files(&dashboard, &report_stem(&clock), dir.path())
            .expect("saved");

        assert!(saved.markdown_path.ends_with("2025-11-03.md"));
        let json = fs::read_to_string(&saved.json_path).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["status"], "ready");
        assert_eq!(value["current_week"], "2025-11-03");
    }
}
