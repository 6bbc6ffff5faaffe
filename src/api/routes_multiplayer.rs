//! Session lifecycle endpoints: create, join, list, fetch, throw.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use super::{blocking, error_json, error_response, AppState};
use crate::error::GameError;
use crate::session::{GameSession, SessionStatus};

const DEFAULT_GAME_TYPE: &str = "standard";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreatePayload {
    host_id: Option<String>,
    host_name: Option<String>,
    game_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JoinPayload {
    guest_id: Option<String>,
    guest_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ThrowPayload {
    player_id: Option<String>,
    pitch_coordinates: Option<Vec<f64>>,
}

#[derive(Deserialize)]
pub(super) struct GamesQuery {
    /// `open` lists every unfinished session instead of only waiting ones.
    #[serde(default)]
    scope: Option<String>,
}

/// Unwrap a JSON body or answer with the parser's message. Anything but an
/// oversized body is a 400.
pub(super) fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(p)| p).map_err(|e| {
        let status = match e.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        error_json(status, e.body_text())
    })
}

fn coordinates(raw: Option<Vec<f64>>) -> Result<[f64; 2], GameError> {
    match raw.as_deref() {
        None => Err(GameError::validation("Missing required field: pitchCoordinates")),
        Some(&[x, y]) => Ok([x, y]),
        Some(_) => Err(GameError::validation(
            "pitchCoordinates must be a pair [x, y]",
        )),
    }
}

pub(super) async fn handler_create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreatePayload>, JsonRejection>,
) -> Response {
    let p = match payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let host_id = p.host_id.unwrap_or_default();
    let host_name = p.host_name.unwrap_or_default();
    let game_type = p
        .game_type
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GAME_TYPE.to_string());

    match blocking(&state, move |s| s.manager.create(&host_id, &host_name, &game_type)).await {
        Ok(session) => {
            state.prom_metrics.sessions_created.inc();
            Json(created_body(&session)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// The session document plus `gameId`, which the lobby uses to navigate.
fn created_body(session: &GameSession) -> serde_json::Value {
    let mut body = serde_json::to_value(session).unwrap_or_default();
    if let Some(obj) = body.as_object_mut() {
        obj.insert("gameId".into(), serde_json::Value::String(session.id.clone()));
    }
    body
}

pub(super) async fn handler_join(
    State(state): State<Arc<AppState>>,
    AxumPath(session_id): AxumPath<String>,
    body: Result<Json<JoinPayload>, JsonRejection>,
) -> Response {
    let p = match payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let guest_id = p.guest_id.unwrap_or_default();
    let guest_name = p.guest_name.unwrap_or_default();

    match blocking(&state, move |s| s.manager.join(&session_id, &guest_id, &guest_name)).await {
        Ok(session) => {
            state.prom_metrics.sessions_joined.inc();
            Json(session).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub(super) async fn handler_games(
    State(state): State<Arc<AppState>>,
    Query(q): Query<GamesQuery>,
) -> Response {
    let open = q.scope.as_deref() == Some("open");
    let listed = blocking(&state, move |s| {
        if open {
            s.manager.list_open()
        } else {
            s.manager.list_waiting()
        }
    })
    .await;
    match listed {
        Ok(sessions) => Json(sessions).into_response(),
        Err(e) => error_response(e),
    }
}

pub(super) async fn handler_game(
    State(state): State<Arc<AppState>>,
    AxumPath(session_id): AxumPath<String>,
) -> Response {
    match blocking(&state, move |s| s.manager.get_session(&session_id)).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}

pub(super) async fn handler_throw(
    State(state): State<Arc<AppState>>,
    AxumPath(session_id): AxumPath<String>,
    body: Result<Json<ThrowPayload>, JsonRejection>,
) -> Response {
    let p = match payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let player_id = p.player_id.unwrap_or_default();
    if let Err(e) = crate::error::require("playerId", &player_id) {
        return error_response(e);
    }
    let coords = match coordinates(p.pitch_coordinates) {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    match blocking(&state, move |s| s.manager.throw(&session_id, &player_id, coords)).await {
        Ok(session) => {
            if let Some(pitch) = &session.game_state.current_pitch {
                state.prom_metrics.record_throw(pitch.result.as_str());
            }
            if session.status == SessionStatus::Completed {
                state.prom_metrics.games_completed.inc();
            }
            Json(session).into_response()
        }
        Err(e) => error_response(e),
    }
}
