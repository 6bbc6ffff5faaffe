//! Schedule pass-through: the day's games and the latest pitch of one.

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use super::{error_json, AppState};
use crate::schedule::{parse_date, ScheduleError};

#[derive(Deserialize)]
pub(super) struct ScheduleQuery {
    date: Option<String>,
}

fn schedule_error(err: ScheduleError) -> Response {
    let status = match &err {
        ScheduleError::BadDate(_) => StatusCode::BAD_REQUEST,
        ScheduleError::GameNotFound(_) => StatusCode::NOT_FOUND,
        ScheduleError::Provider(e) => {
            warn!(error = %e, "schedule provider request failed");
            StatusCode::BAD_GATEWAY
        }
    };
    error_json(status, err.to_string())
}

pub(super) async fn handler_games(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ScheduleQuery>,
) -> Response {
    let date = match q.date.as_deref() {
        Some(raw) => match parse_date(raw) {
            Ok(d) => d,
            Err(e) => return schedule_error(e),
        },
        None => chrono::Utc::now().date_naive(),
    };
    match state.schedule.fetch_schedule(date).await {
        Ok(games) => Json(games).into_response(),
        Err(e) => schedule_error(e),
    }
}

pub(super) async fn handler_live(
    State(state): State<Arc<AppState>>,
    AxumPath(game_pk): AxumPath<u64>,
) -> Response {
    match state.schedule.fetch_live(game_pk).await {
        Ok(live) => Json(live).into_response(),
        Err(e) => schedule_error(e),
    }
}
