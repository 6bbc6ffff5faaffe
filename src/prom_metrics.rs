//! # Prometheus Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `pitchdarts_sessions_created_total` | Counter | | Sessions created |
//! | `pitchdarts_sessions_joined_total` | Counter | | Guests seated |
//! | `pitchdarts_throws_total` | Counter | `zone` | Accepted throws by zone |
//! | `pitchdarts_games_completed_total` | Counter | | Games that reached the win threshold |
//! | `pitchdarts_sessions_expired_total` | Counter | | Waiting sessions removed by the idle sweep |
//! | `pitchdarts_http_request_duration_seconds` | Histogram | `method`, `path` | Request latency |
//!
//! The `/metrics` endpoint renders the current registry state on each scrape.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct ZoneLabel {
    pub zone: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct HttpLabel {
    pub method: String,
    pub path: String,
}

/// All fields are atomic and safe to update from any task.
pub struct Metrics {
    pub registry: Registry,
    pub sessions_created: Counter,
    pub sessions_joined: Counter,
    pub throws: Family<ZoneLabel, Counter>,
    pub games_completed: Counter,
    pub sessions_expired: Counter,
    pub http_request_duration: Family<HttpLabel, Histogram>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let sessions_created = Counter::default();
        registry.register(
            "pitchdarts_sessions_created",
            "Total sessions created",
            sessions_created.clone(),
        );

        let sessions_joined = Counter::default();
        registry.register(
            "pitchdarts_sessions_joined",
            "Total sessions joined by a guest",
            sessions_joined.clone(),
        );

        let throws = Family::<ZoneLabel, Counter>::default();
        registry.register(
            "pitchdarts_throws",
            "Accepted throws by zone",
            throws.clone(),
        );

        let games_completed = Counter::default();
        registry.register(
            "pitchdarts_games_completed",
            "Games that reached the win threshold",
            games_completed.clone(),
        );

        let sessions_expired = Counter::default();
        registry.register(
            "pitchdarts_sessions_expired",
            "Waiting sessions removed by the idle sweep",
            sessions_expired.clone(),
        );

        let http_request_duration: Family<HttpLabel, Histogram> =
            Family::new_with_constructor(|| Histogram::new(exponential_buckets(0.001, 2.0, 14)));
        registry.register(
            "pitchdarts_http_request_duration_seconds",
            "HTTP request latency",
            http_request_duration.clone(),
        );

        Self {
            registry,
            sessions_created,
            sessions_joined,
            throws,
            games_completed,
            sessions_expired,
            http_request_duration,
        }
    }

    pub fn record_throw(&self, zone: &str) {
        self.throws
            .get_or_create(&ZoneLabel {
                zone: zone.to_string(),
            })
            .inc();
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        if let Err(e) = encode(&mut buf, &self.registry) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
