use crate::analyzer;
use crate::analyzer::report::Dashboard;
use crate::analyzer::schedule::NextSession;
use crate::clock::{Clock, FixedClock};
use crate::config::Config;
use crate::db::{Database, Table};
use crate::error::LogbookError;
use crate::records::{
    self, CssTest, CssTestInput, Session, SessionInput, Target, TargetInput, parse_iso_date,
};
use anyhow::anyhow;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub store: Arc<Mutex<Database>>,
    pub clock: Arc<dyn Clock + Send + Sync>,
}

impl ApiState {
    fn store(&self) -> ApiResult<MutexGuard<'_, Database>> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal(anyhow!("record store lock poisoned")))
    }

    /// `as_of` pins "now" for this request; otherwise the process clock.
    fn clock_for(&self, as_of: Option<&str>) -> ApiResult<FixedClock> {
        match as_of {
            Some(raw) => Ok(FixedClock::at_date(parse_iso_date(raw)?)),
            None => Ok(FixedClock(self.clock.now())),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/dashboard", get(dashboard))
        .route("/api/v1/next-session", get(next_session))
        .route("/api/v1/sessions", get(sessions_list).post(sessions_create))
        .route("/api/v1/css-tests", get(css_tests_list).post(css_tests_create))
        .route("/api/v1/targets", get(targets_list).post(targets_create))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AsOfQuery {
    as_of: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    rows: BTreeMap<&'static str, usize>,
    latest_session_date: Option<String>,
    api_port: u16,
}

#[derive(Debug, Serialize)]
struct NextSessionPayload {
    next_session: Option<NextSession>,
    message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ListPayload<T> {
    count: usize,
    rows: Vec<T>,
}

impl<T> From<Vec<T>> for ListPayload<T> {
    fn from(rows: Vec<T>) -> Self {
        Self {
            count: rows.len(),
            rows,
        }
    }
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let database = state.store()?;
    let rows = Table::ALL
        .into_iter()
        .map(|table| database.count(table).map(|count| (table.name(), count)))
        .collect::<anyhow::Result<BTreeMap<_, _>>>()?;

    Ok(Json(StatusPayload {
        rows,
        latest_session_date: database.latest_session_date()?,
        api_port: state.config.api_port,
    }))
}

async fn dashboard(
    State(state): State<ApiState>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<Dashboard>> {
    let clock = state.clock_for(query.as_of.as_deref())?;
    let database = state.store()?;
    let dashboard = analyzer::build_dashboard(&state.config, &*database, &clock)?;

    Ok(Json(dashboard))
}

async fn next_session(
    State(state): State<ApiState>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<NextSessionPayload>> {
    let clock = state.clock_for(query.as_of.as_deref())?;
    let schedule = analyzer::load_schedule(&state.config)?;
    let next_session = schedule.next_session(clock.today());

    Ok(Json(NextSessionPayload {
        message: next_session.is_none().then_some("No upcoming session"),
        next_session,
    }))
}

async fn sessions_list(State(state): State<ApiState>) -> ApiResult<Json<ListPayload<Session>>> {
    let database = state.store()?;
    let sessions = records::load_sessions(&*database).map_err(ApiError::stored)?;
    Ok(Json(sessions.into()))
}

async fn sessions_create(
    State(state): State<ApiState>,
    payload: Result<Json<SessionInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let Json(payload) = payload?;
    let session = payload.into_session(state.clock.today())?;
    records::save_session(&mut *state.store()?, &session)?;

    Ok((StatusCode::CREATED, Json(session)))
}

async fn css_tests_list(State(state): State<ApiState>) -> ApiResult<Json<ListPayload<CssTest>>> {
    let database = state.store()?;
    let tests = records::load_css_tests(&*database).map_err(ApiError::stored)?;
    Ok(Json(tests.into()))
}

async fn css_tests_create(
    State(state): State<ApiState>,
    payload: Result<Json<CssTestInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CssTest>)> {
    let Json(payload) = payload?;
    let test = payload.into_css_test(state.clock.today())?;
    records::save_css_test(&mut *state.store()?, &test)?;

    Ok((StatusCode::CREATED, Json(test)))
}

async fn targets_list(State(state): State<ApiState>) -> ApiResult<Json<ListPayload<Target>>> {
    let database = state.store()?;
    let targets = records::load_targets(&*database).map_err(ApiError::stored)?;
    Ok(Json(targets.into()))
}

async fn targets_create(
    State(state): State<ApiState>,
    payload: Result<Json<TargetInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Target>)> {
    let Json(payload) = payload?;
    let target = payload.into_target(state.clock.today())?;
    records::save_target(&mut *state.store()?, &target)?;

    Ok((StatusCode::CREATED, Json(target)))
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl From<LogbookError> for ApiError {
    fn from(value: LogbookError) -> Self {
        match value {
            LogbookError::InvalidInput(message) => Self::BadRequest(message),
            other => Self::Internal(other.into()),
        }
    }
}

impl ApiError {
    /// Stored rows that fail to parse answer 500.
    fn stored(error: LogbookError) -> Self {
        Self::Internal(error.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{error:#}") })),
            )
                .into_response(),
        }
    }
}
