//! Local HTTP API over the activity store
//!
//! Handlers are thin: parse the request, call the store then the view
//! engine, map errors to status codes. Reports come back as plain text,
//! records as JSON.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use clockin_core::view::{self, tag_key, DayWindow, KeyFn};
use clockin_core::{Database, Error, QueryArg};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Clone)]
struct AppState {
    db: Arc<Database>,
    window: DayWindow,
}

/// Run the HTTP server until the process is stopped.
pub async fn run(addr: &str, db: Database, window: DayWindow) -> anyhow::Result<()> {
    let state = AppState {
        db: Arc::new(db),
        window,
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "serving HTTP API");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/recent", get(recent))
        .route("/api/latest/{title}", get(latest))
        .route("/api/ongoing", get(ongoing))
        .route("/api/start/{title}", post(start))
        .route("/api/finish", post(finish))
        .route("/api/report/{start}/{end}", get(report))
        .with_state(state)
}

/// Map store/view errors onto status codes: conflicts from the
/// single-open-activity and duplicate guards are 409, validation errors are
/// 400, anything else is a 500.
fn store_error(err: Error) -> Response {
    let status = match err {
        Error::OngoingExists | Error::DuplicateActivity => StatusCode::CONFLICT,
        Error::NonUtcTime | Error::UnknownViewType(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, message.to_string()).into_response()
}

async fn recent(State(state): State<AppState>) -> Response {
    match state.db.recent_titles(5) {
        Ok(titles) => Json(titles).into_response(),
        Err(err) => store_error(err),
    }
}

async fn latest(State(state): State<AppState>, Path(title): Path<String>) -> Response {
    match state.db.last_finished(Some(&title)) {
        Ok(Some(activity)) => Json(activity).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "no finished activity").into_response(),
        Err(err) => store_error(err),
    }
}

async fn ongoing(State(state): State<AppState>) -> Response {
    match state.db.ongoing() {
        Ok(open) => Json(open).into_response(),
        Err(err) => store_error(err),
    }
}

async fn start(State(state): State<AppState>, Path(title): Path<String>) -> Response {
    match state.db.start_title(&title, "") {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => store_error(err),
    }
}

async fn finish(State(state): State<AppState>, notes: String) -> Response {
    match state.db.finish(&notes) {
        Ok(Some(title)) => title.into_response(),
        Ok(None) => Body::empty().into_response(),
        Err(err) => store_error(err),
    }
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    view_type: Option<String>,
    #[serde(default)]
    by_tag: bool,
}

async fn report(
    State(state): State<AppState>,
    Path((start, end)): Path<(String, String)>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let Ok(start_day) = NaiveDate::parse_from_str(&start, "%Y-%m-%d") else {
        return bad_request("invalid format of query start");
    };
    let Ok(end_day) = NaiveDate::parse_from_str(&end, "%Y-%m-%d") else {
        return bad_request("invalid format of query end");
    };

    let (query_start, query_end) = crate::commands::day_range(start_day, end_day);
    let activities = match state.db.finished(query_start, query_end, &QueryArg::Any) {
        Ok(activities) => activities,
        Err(err) => return store_error(err),
    };

    let view_type = query.view_type.as_deref().unwrap_or("summary");
    let key: Option<KeyFn> = if query.by_tag { Some(tag_key) } else { None };
    match view::render(&activities, view_type, key, state.window) {
        Ok(text) => text.into_response(),
        Err(err) => store_error(err),
    }
}
