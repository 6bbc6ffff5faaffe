//! Leaderboard endpoints and the external game-result submission.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as AxumPath, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use super::routes_multiplayer::payload;
use super::{blocking, error_response, AppState};
use crate::leaderboard::{Participant, PlayerRecord, DEFAULT_LIMIT, MAX_LIMIT};

#[derive(Deserialize)]
pub(super) struct LeaderboardQuery {
    limit: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResultPayload {
    player1_id: Option<String>,
    player1_name: Option<String>,
    player2_id: Option<String>,
    player2_name: Option<String>,
    winner_id: Option<String>,
}

/// An absent or non-integer limit falls back to the default.
fn clamp_limit(raw: Option<&str>) -> usize {
    match raw.and_then(|l| l.trim().parse::<i64>().ok()) {
        None => DEFAULT_LIMIT,
        Some(n) => n.clamp(1, MAX_LIMIT as i64) as usize,
    }
}

/// Leaderboard rows with a 1-based `rank` added.
fn ranked_rows(players: &[PlayerRecord]) -> Vec<serde_json::Value> {
    players
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let mut row = serde_json::to_value(p).ok()?;
            row.as_object_mut()?.insert("rank".into(), (i + 1).into());
            Some(row)
        })
        .collect()
}

pub(super) async fn handler_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LeaderboardQuery>,
) -> Response {
    let limit = clamp_limit(q.limit.as_deref());
    match blocking(&state, move |s| s.manager.leaderboard().top_players(limit)).await {
        Ok(players) => Json(ranked_rows(&players)).into_response(),
        Err(e) => error_response(e),
    }
}

pub(super) async fn handler_player(
    State(state): State<Arc<AppState>>,
    AxumPath(player_id): AxumPath<String>,
) -> Response {
    match blocking(&state, move |s| s.manager.leaderboard().get_player(&player_id)).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => error_response(e),
    }
}

pub(super) async fn handler_result(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ResultPayload>, JsonRejection>,
) -> Response {
    let p = match payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let recorded = blocking(&state, move |s| {
        let player1 = Participant {
            id: p.player1_id.as_deref().unwrap_or_default(),
            name: p.player1_name.as_deref().unwrap_or_default(),
        };
        let player2 = Participant {
            id: p.player2_id.as_deref().unwrap_or_default(),
            name: p.player2_name.as_deref().unwrap_or_default(),
        };
        let winner_id = p.winner_id.as_deref().unwrap_or_default();
        s.manager
            .leaderboard()
            .record_result(player1, player2, winner_id)
    })
    .await;
    match recorded {
        Ok(_) => Json(serde_json::json!({"success": true})).into_response(),
        Err(e) => error_response(e),
    }
}
