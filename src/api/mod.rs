//! # API: HTTP Surface for Sessions, Leaderboard, and Schedule
//!
//! Runs an Axum HTTP server over a [`SessionManager`]. Core calls do blocking
//! storage I/O, so every handler hands them to [`blocking`], which runs them
//! on tokio's blocking pool.
//!
//! Error mapping: validation, invalid state and wrong-turn errors are 400,
//! unknown ids 404, storage failures 500. Every error body is
//! `{"error": "<message>"}`.

mod routes_health;
mod routes_leaderboard;
mod routes_multiplayer;
mod routes_schedule;

use anyhow::Result;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Instrument};

use crate::config::Config;
use crate::db::Database;
use crate::error::GameError;
use crate::manager::SessionManager;
use crate::prom_metrics;
use crate::schedule::ScheduleClient;

const BODY_LIMIT_BYTES: usize = 64 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AppState {
    pub db: Arc<Database>,
    pub manager: SessionManager,
    pub schedule: ScheduleClient,
    pub prom_metrics: prom_metrics::Metrics,
}

impl AppState {
    pub fn new(db: Arc<Database>, schedule: ScheduleClient) -> Arc<Self> {
        Arc::new(AppState {
            manager: SessionManager::new(db.clone()),
            db,
            schedule,
            prom_metrics: prom_metrics::Metrics::new(),
        })
    }
}

/// Run a blocking core call off the async executor.
pub(super) async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, GameError>
where
    F: FnOnce(&AppState) -> Result<T, GameError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    match tokio::task::spawn_blocking(move || f(&state)).await {
        Ok(result) => result,
        Err(e) => Err(GameError::Storage(anyhow::anyhow!("blocking task failed: {e}"))),
    }
}

pub(super) fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": message.into()}))).into_response()
}

pub(super) fn error_response(err: GameError) -> Response {
    let status = match &err {
        GameError::Validation(_) | GameError::InvalidState { .. } | GameError::NotYourTurn { .. } => {
            StatusCode::BAD_REQUEST
        }
        GameError::NotFound { .. } => StatusCode::NOT_FOUND,
        GameError::Storage(e) => {
            error!(error = %format!("{e:#}"), "storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_json(status, err.to_string())
}

/// Records request latency, tags the request with an id (propagated from
/// `x-request-id` or generated), and runs the handler inside a span.
async fn metrics_middleware(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().to_string();
    let raw_path = req.uri().path().to_string();
    let norm_path = normalize_path(&raw_path);
    let start = std::time::Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %raw_path,
    );
    let mut response = next.run(req).instrument(span).await;

    state
        .prom_metrics
        .http_request_duration
        .get_or_create(&prom_metrics::HttpLabel {
            method,
            path: norm_path,
        })
        .observe(start.elapsed().as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Collapse session UUIDs and numeric game ids so histogram labels stay
/// bounded.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if seg.is_empty() {
                seg.to_string()
            } else if seg.chars().all(|c| c.is_ascii_digit()) {
                ":id".to_string()
            } else if seg.len() == 36 && seg.chars().filter(|c| *c == '-').count() == 4 {
                ":uuid".to_string()
            } else {
                seg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route(
            "/multiplayer/create",
            post(routes_multiplayer::handler_create),
        )
        .route(
            "/multiplayer/join/{session_id}",
            post(routes_multiplayer::handler_join),
        )
        .route("/multiplayer/games", get(routes_multiplayer::handler_games))
        .route(
            "/multiplayer/game/{session_id}",
            get(routes_multiplayer::handler_game),
        )
        .route(
            "/multiplayer/game/{session_id}/throw",
            post(routes_multiplayer::handler_throw),
        )
        .route("/games/result", post(routes_leaderboard::handler_result))
        .route("/leaderboard", get(routes_leaderboard::handler_leaderboard))
        .route(
            "/leaderboard/player/{player_id}",
            get(routes_leaderboard::handler_player),
        )
        .route("/games", get(routes_schedule::handler_games))
        .route("/live/{game_pk}", get(routes_schedule::handler_live))
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/readyz", get(routes_health::handler_readyz))
        .route("/metrics", get(routes_health::handler_metrics));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
    .layer(CatchPanicLayer::new())
    .layer(axum::middleware::from_fn_with_state(
        state.clone(),
        metrics_middleware,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
    .layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        REQUEST_TIMEOUT,
    ))
    .with_state(state)
}

/// Periodically drop waiting sessions nobody joined.
fn spawn_idle_sweep(state: Arc<AppState>, idle: Duration, every: Duration) {
    let max_idle = match chrono::Duration::from_std(idle) {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "idle timeout out of range, sweep disabled");
            return;
        }
    };
    info!(idle_secs = idle.as_secs(), every_secs = every.as_secs(), "idle session sweep enabled");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            match blocking(&state, move |s| s.manager.expire_idle(max_idle)).await {
                Ok(0) => {}
                Ok(n) => {
                    state.prom_metrics.sessions_expired.inc_by(n as u64);
                    info!(count = n, "expired idle sessions");
                }
                Err(e) => warn!(error = %e, "idle session sweep failed"),
            }
        }
    });
}

pub async fn run(config: &Config, db: Arc<Database>) -> Result<()> {
    let schedule = ScheduleClient::new(&config.schedule_url, config.schedule_timeout)?;
    let state = AppState::new(db, schedule);
    let app = build_router(state.clone(), config.static_dir.as_deref());

    if let Some(idle) = config.idle_timeout {
        spawn_idle_sweep(Arc::clone(&state), idle, config.sweep_interval);
    }

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(port = config.port, data_dir = %config.data_dir.display(), "pitchdarts running");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("pitchdarts shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! { _ = ctrl_c => info!("received SIGINT, shutting down"), _ = sigterm.recv() => info!("received SIGTERM, shutting down") }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await.ok();
                info!("received SIGINT, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_keeps_static_routes() {
        assert_eq!(normalize_path("/leaderboard"), "/leaderboard");
        assert_eq!(normalize_path("/multiplayer/games"), "/multiplayer/games");
        assert_eq!(normalize_path("/metrics"), "/metrics");
    }

    #[test]
    fn normalize_path_collapses_session_ids() {
        assert_eq!(
            normalize_path("/multiplayer/game/550e8400-e29b-41d4-a716-446655440000/throw"),
            "/multiplayer/game/:uuid/throw"
        );
        assert_eq!(normalize_path("/live/778899"), "/live/:id");
    }

    #[test]
    fn error_statuses() {
        let cases = [
            (GameError::validation("x"), StatusCode::BAD_REQUEST),
            (GameError::session_not_found("s"), StatusCode::NOT_FOUND),
            (
                GameError::NotYourTurn {
                    player: "a".into(),
                    expected: "b".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                GameError::Storage(anyhow::anyhow!("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(error_response(err).status(), status);
        }
    }
}
