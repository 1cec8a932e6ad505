//! Weekly training-load model.
//!
//! Sessions are bucketed by (week, swimmer), weeks starting on Monday. Per
//! bucket we report distance, load (`km * rpe`), RPE mean and sample standard
//! deviation, monotony (`mean / std`) and strain (`monotony * load`).
//!
//! Every sum is folded over integers (meters, RPE points) and only divided at
//! the end, so the result does not depend on the order sessions were logged.

use crate::clock::Clock;
use crate::records::{Session, Swimmer};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WeekKey {
    pub week: NaiveDate,
    pub swimmer: Swimmer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeeklyLoad {
    pub sessions: u32,
    pub total_distance_km: f64,
    pub total_load: f64,
    pub mean_rpe: f64,
    /// Sample (N-1) standard deviation; 0 for single-session weeks.
    pub std_rpe: f64,
    pub monotony: f64,
    pub strain: f64,
}

pub type WeeklyLoads = BTreeMap<WeekKey, WeeklyLoad>;

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    sessions: u64,
    distance_m: u64,
    load_m: u64,
    rpe_sum: u64,
    rpe_squares: u64,
}

impl Bucket {
    fn add(mut self, session: &Session) -> Self {
        let rpe = u64::from(session.rpe);
        let distance = u64::from(session.distance_m);

        self.sessions += 1;
        self.distance_m += distance;
        self.load_m += distance * rpe;
        self.rpe_sum += rpe;
        self.rpe_squares += rpe * rpe;
        self
    }

    fn finish(self) -> WeeklyLoad {
        let n = self.sessions as f64;
        let total_distance_km = self.distance_m as f64 / 1000.0;
        let total_load = self.load_m as f64 / 1000.0;
        let mean_rpe = self.rpe_sum as f64 / n;
        let std_rpe = sample_std(self.sessions, self.rpe_sum, self.rpe_squares);
        let monotony = mean_rpe / monotony_divisor(std_rpe);

        WeeklyLoad {
            sessions: self.sessions as u32,
            total_distance_km,
            total_load,
            mean_rpe,
            std_rpe,
            monotony,
            strain: monotony * total_load,
        }
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn current_week(clock: &impl Clock) -> NaiveDate {
    week_start(clock.today())
}

/// Exactly seven days before the given week start.
pub fn previous_week(week: NaiveDate) -> NaiveDate {
    week - Duration::days(7)
}

pub fn aggregate_weekly(sessions: &[Session]) -> WeeklyLoads {
    sessions
        .iter()
        .fold(BTreeMap::<WeekKey, Bucket>::new(), |mut acc, session| {
            let key = WeekKey {
                week: week_start(session.date),
                swimmer: session.swimmer,
            };
            let bucket = acc.entry(key).or_default();
            *bucket = bucket.add(session);
            acc
        })
        .into_iter()
        .map(|(key, bucket)| (key, bucket.finish()))
        .collect()
}

/// Swimmers with at least one session in `week`, roster order.
pub fn week_rows(loads: &WeeklyLoads, week: NaiveDate) -> Vec<(Swimmer, WeeklyLoad)> {
    loads
        .iter()
        .filter(|(key, _)| key.week == week)
        .map(|(key, load)| (key.swimmer, *load))
        .collect()
}

fn sample_std(n: u64, sum: u64, squares: u64) -> f64 {
    if n < 2 {
        return 0.0;
    }

    // n * Σx² - (Σx)² is never negative (Cauchy-Schwarz).
    let numerator = n * squares - sum * sum;
    let denominator = n * (n - 1);
    (numerator as f64 / denominator as f64).sqrt()
}

/// Zero variance divides by 1 instead, so a flat week reports monotony == mean RPE.
fn monotony_divisor(std_rpe: f64) -> f64 {
    if std_rpe == 0.0 { 1.0 } else { std_rpe }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::records::Environment;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn session(on: NaiveDate, swimmer: Swimmer, distance_m: u32, rpe: u8) -> Session {
        Session {
            date: on,
            environment: Environment::Pool,
            distance_m,
            total_time_min: 45.0,
            moving_time_min: None,
            rest_estimate_min: 0.0,
            sets_text: String::new(),
            css_pace: None,
            avg_pace: None,
            rpe,
            notes: String::new(),
            team: String::new(),
            swimmer,
        }
    }

    fn close(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-3
    }

    #[test]
    fn weeks_start_on_monday() {
        assert_eq!(week_start(date(2025, 11, 3)), date(2025, 11, 3));
        assert_eq!(week_start(date(2025, 11, 5)), date(2025, 11, 3));
        assert_eq!(week_start(date(2025, 11, 9)), date(2025, 11, 3));
        assert_eq!(week_start(date(2025, 11, 10)), date(2025, 11, 10));
        assert_eq!(week_start(date(2026, 1, 1)), date(2025, 12, 29));
    }

    #[test]
    fn current_and_previous_week_follow_the_clock() {
        let clock = FixedClock::at_date(date(2025, 11, 6));
        let current = current_week(&clock);
        assert_eq!(current, date(2025, 11, 3));
        assert_eq!(previous_week(current), date(2025, 10, 27));
    }

    #[test]
    fn two_session_week_matches_hand_computation() {
        let sessions = vec![
            session(date(2025, 11, 3), Swimmer::Aa, 1000, 4),
            session(date(2025, 11, 5), Swimmer::Aa, 2000, 6),
        ];
        let loads = aggregate_weekly(&sessions);
        let load = loads[&WeekKey {
            week: date(2025, 11, 3),
            swimmer: Swimmer::Aa,
        }];

        assert_eq!(load.sessions, 2);
        assert!(close(load.total_distance_km, 3.0));
        assert!(close(load.total_load, 16.0));
        assert!(close(load.mean_rpe, 5.0));
        assert!(close(load.std_rpe, 2f64.sqrt()));
        assert!(close(load.monotony, 3.536));
        assert!((load.strain - 56.57).abs() < 0.01);
    }

    #[test]
    fn single_session_week_falls_back_to_mean() {
        let loads = aggregate_weekly(&[session(date(2025, 11, 4), Swimmer::Bvh, 1500, 7)]);
        let load = loads.values().next().expect("one bucket");

        assert_eq!(load.std_rpe, 0.0);
        assert_eq!(load.monotony, load.mean_rpe);
        assert!(close(load.strain, 7.0 * 1.5 * 7.0));
    }

    #[test]
    fn identical_rpe_week_falls_back_to_mean() {
        let loads = aggregate_weekly(&[
            session(date(2025, 11, 4), Swimmer::Fgq, 1000, 5),
            session(date(2025, 11, 6), Swimmer::Fgq, 3000, 5),
        ]);
        let load = loads.values().next().expect("one bucket");

        assert_eq!(load.std_rpe, 0.0);
        assert_eq!(load.monotony, 5.0);
        assert!(close(load.strain, 5.0 * 20.0));
    }

    #[test]
    fn distance_is_conserved_across_buckets() {
        let sessions = vec![
            session(date(2025, 10, 28), Swimmer::Aa, 1200, 3),
            session(date(2025, 11, 2), Swimmer::Avh, 800, 9),
            session(date(2025, 11, 3), Swimmer::Aa, 2350, 6),
            session(date(2025, 11, 9), Swimmer::Fgq, 3100, 4),
            session(date(2025, 11, 17), Swimmer::Bvh, 0, 1),
        ];
        let loads = aggregate_weekly(&sessions);

        let bucketed = loads.values().map(|load| load.total_distance_km).sum::<f64>();
        let raw = sessions.iter().map(|s| f64::from(s.distance_m)).sum::<f64>() / 1000.0;
        assert!(close(bucketed, raw));
        assert_eq!(loads.len(), 5);
    }

    #[test]
    fn order_does_not_matter() {
        let sessions = vec![
            session(date(2025, 11, 3), Swimmer::Aa, 1234, 3),
            session(date(2025, 11, 4), Swimmer::Aa, 987, 8),
            session(date(2025, 11, 5), Swimmer::Aa, 3333, 5),
            session(date(2025, 11, 6), Swimmer::Bvh, 2100, 7),
            session(date(2025, 11, 12), Swimmer::Bvh, 1700, 2),
        ];
        let forward = aggregate_weekly(&sessions);

        let mut reversed = sessions.clone();
        reversed.reverse();
        assert_eq!(aggregate_weekly(&reversed), forward);

        let mut rotated = sessions.clone();
        rotated.rotate_left(2);
        assert_eq!(aggregate_weekly(&rotated), forward);
    }

    #[test]
    fn absent_swimmers_have_no_bucket() {
        let loads = aggregate_weekly(&[
            session(date(2025, 11, 3), Swimmer::Aa, 1000, 5),
            session(date(2025, 11, 11), Swimmer::Bvh, 1000, 5),
        ]);

        let first_week = week_rows(&loads, date(2025, 11, 3));
        assert_eq!(first_week.len(), 1);
        assert_eq!(first_week[0].0, Swimmer::Aa);
        assert!(week_rows(&loads, date(2025, 10, 27)).is_empty());
    }

    #[test]
    fn no_sessions_no_weeks() {
        assert!(aggregate_weekly(&[]).is_empty());
    }
}
