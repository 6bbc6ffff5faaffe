//! # Health & Observability Endpoints
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /healthz` | Liveness: process is serving HTTP |
//! | `GET /readyz` | Readiness: storage backend writable |
//! | `GET /metrics` | Prometheus scrape |
//!
//! The readiness probe runs the backend health check with a 2-second
//! timeout and answers 503 if it fails or stalls.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::AppState;

const READY_TIMEOUT: Duration = Duration::from_secs(2);

pub(super) async fn handler_healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(super) async fn handler_readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db = Arc::clone(&state.db);
    let check = tokio::time::timeout(
        READY_TIMEOUT,
        tokio::task::spawn_blocking(move || db.health_check()),
    )
    .await;

    match check {
        Ok(Ok(Ok(()))) => (StatusCode::OK, "ok"),
        Ok(Ok(Err(e))) => {
            warn!(error = %format!("{e:#}"), "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable")
        }
        Ok(Err(_)) => (StatusCode::SERVICE_UNAVAILABLE, "storage check panicked"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage timeout"),
    }
}

pub(super) async fn handler_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.prom_metrics.encode();
    (
        StatusCode::OK,
        [(
            "content-type",
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
}
