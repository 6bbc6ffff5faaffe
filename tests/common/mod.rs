//! Shared helpers for pitchdarts integration tests.
//!
//! Apps are built over an in-memory store unless a test passes its own
//! [`Database`]. The stats provider is replaced by [`start_mock_provider`],
//! an axum server on a random local port.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use pitchdarts::api::{build_router, AppState};
use pitchdarts::db::Database;
use pitchdarts::schedule::ScheduleClient;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Nothing listens here; schedule calls fail fast.
pub const DEAD_PROVIDER: &str = "http://127.0.0.1:9";

/// gamePk the mock provider knows about.
pub const LIVE_GAME_PK: u64 = 778899;

pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(Database::in_memory()), DEAD_PROVIDER)
}

pub fn build_test_app_with(db: Arc<Database>, schedule_url: &str) -> Router {
    let schedule = ScheduleClient::new(schedule_url, Duration::from_secs(2)).unwrap();
    build_router(AppState::new(db, schedule), None)
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::json!(null));
    (status, json)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// Create a session and seat a guest. Returns the session id.
pub async fn start_game(app: &Router, host: &str, guest: &str) -> String {
    let (status, created) = post_json(
        app,
        "/multiplayer/create",
        serde_json::json!({"hostId": host, "hostName": host.to_uppercase(), "gameType": "standard"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["gameId"].as_str().unwrap().to_string();
    let (status, _) = post_json(
        app,
        &format!("/multiplayer/join/{id}"),
        serde_json::json!({"guestId": guest, "guestName": guest.to_uppercase()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    id
}

async fn mock_schedule() -> impl IntoResponse {
    Json(serde_json::json!({
        "totalGames": 2,
        "dates": [{"date": "2025-03-14", "games": [
            {"gamePk": LIVE_GAME_PK, "gameDate": "2025-03-14T17:05:00Z",
             "teams": {"home": {"team": {"name": "Boston Red Sox"}},
                       "away": {"team": {"name": "New York Yankees"}}}},
            {"gamePk": 778900, "gameDate": "2025-03-14T23:10:00Z",
             "teams": {"home": {"team": {"name": "Chicago Cubs"}},
                       "away": {"team": {"name": "San Diego Padres"}}}}
        ]}]
    }))
}

async fn mock_live(Path(game_pk): Path<u64>) -> axum::response::Response {
    if game_pk != LIVE_GAME_PK {
        return (StatusCode::NOT_FOUND, "no such game").into_response();
    }
    Json(serde_json::json!({
        "gameData": {"status": {"abstractGameState": "Live"}},
        "liveData": {"plays": {"currentPlay": {
            "count": {"balls": 2, "strikes": 1, "outs": 1},
            "playEvents": [
                {"isPitch": true, "details": {"isStrike": false, "isBall": true},
                 "pitchData": {"coordinates": {"x": 101.5, "y": 180.25}}}
            ]
        }}}
    }))
    .into_response()
}

/// Serve canned stats-provider responses. Returns the base URL.
pub async fn start_mock_provider() -> String {
    let router = Router::new()
        .route("/api/v1/schedule", get(mock_schedule))
        .route("/api/v1.1/game/{game_pk}/feed/live", get(mock_live));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
