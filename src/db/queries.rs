pub const CREATE_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
  id                INTEGER PRIMARY KEY AUTOINCREMENT,
  date              TEXT NOT NULL DEFAULT '',
  environment       TEXT NOT NULL DEFAULT '',
  distance_m        TEXT NOT NULL DEFAULT '',
  total_time_min    TEXT NOT NULL DEFAULT '',
  moving_time_min   TEXT NOT NULL DEFAULT '',
  rest_estimate_min TEXT NOT NULL DEFAULT '',
  sets_text         TEXT NOT NULL DEFAULT '',
  css_pace          TEXT NOT NULL DEFAULT '',
  avg_pace          TEXT NOT NULL DEFAULT '',
  rpe               TEXT NOT NULL DEFAULT '',
  notes             TEXT NOT NULL DEFAULT '',
  team              TEXT NOT NULL DEFAULT '',
  swimmer           TEXT NOT NULL DEFAULT ''
);
"#;

pub const CREATE_CSS_TESTS: &str = r#"
CREATE TABLE IF NOT EXISTS css_tests (
  id            INTEGER PRIMARY KEY AUTOINCREMENT,
  date          TEXT NOT NULL DEFAULT '',
  swimmer       TEXT NOT NULL DEFAULT '',
  time_200_s    TEXT NOT NULL DEFAULT '',
  time_400_s    TEXT NOT NULL DEFAULT '',
  css_s_per_100 TEXT NOT NULL DEFAULT ''
);
"#;

pub const CREATE_TARGETS: &str = r#"
CREATE TABLE IF NOT EXISTS targets (
  id         INTEGER PRIMARY KEY AUTOINCREMENT,
  week_start TEXT NOT NULL DEFAULT '',
  swimmer    TEXT NOT NULL DEFAULT '',
  km_target  TEXT NOT NULL DEFAULT ''
);
"#;

pub const INDEX_SESSIONS_DATE: &str =
    "CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_SESSIONS,
        CREATE_CSS_TESTS,
        CREATE_TARGETS,
        INDEX_SESSIONS_DATE,
    ]
}
