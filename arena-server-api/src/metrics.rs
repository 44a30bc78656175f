use std::{sync::Arc, sync::atomic::AtomicU64, time::Instant};

use arena_domain::{
    matches::MatchType,
    metrics::MetricsSink,
};
use axum::{
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus_client::{
    encoding::{EncodeLabelSet, text::encode},
    metrics::{counter::Counter, family::Family, gauge::Gauge, histogram::Histogram},
    registry::Registry,
};

use crate::{ApiError, ApiState};

const DURATION_BUCKETS: [f64; 7] = [0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: String,
    pub endpoint: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct EndpointLabels {
    pub method: String,
    pub endpoint: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct MatchLabels {
    pub match_type: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ItemLabels {
    pub item_type: String,
}

/// Explicitly constructed metrics registry, built once at process start and
/// read back by the exposition endpoint.
pub struct ApiMetrics {
    registry: Registry,
    http_requests: Family<HttpLabels, Counter>,
    http_request_duration_seconds: Family<EndpointLabels, Histogram>,
    http_requests_in_progress: Family<EndpointLabels, Gauge>,
    active_players_count: Gauge,
    matches: Family<MatchLabels, Counter>,
    revenue_usd: Family<ItemLabels, Counter<f64, AtomicU64>>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests = Family::<HttpLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total HTTP requests",
            http_requests.clone(),
        );

        let http_request_duration_seconds =
            Family::<EndpointLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(DURATION_BUCKETS.into_iter())
            });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            http_request_duration_seconds.clone(),
        );

        let http_requests_in_progress = Family::<EndpointLabels, Gauge>::default();
        registry.register(
            "http_requests_in_progress",
            "Number of HTTP requests currently being processed",
            http_requests_in_progress.clone(),
        );

        let active_players_count = Gauge::default();
        registry.register(
            "active_players_count",
            "Number of active players",
            active_players_count.clone(),
        );

        let matches = Family::<MatchLabels, Counter>::default();
        registry.register("matches", "Total matches created", matches.clone());

        let revenue_usd = Family::<ItemLabels, Counter<f64, AtomicU64>>::default();
        registry.register("revenue_usd", "Total revenue in USD", revenue_usd.clone());

        Self {
            registry,
            http_requests,
            http_request_duration_seconds,
            http_requests_in_progress,
            active_players_count,
            matches,
            revenue_usd,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prometheus-backed implementation of the domain's observability seam.
pub struct PrometheusMetricsSink {
    metrics: Arc<ApiMetrics>,
}

impl PrometheusMetricsSink {
    pub fn new(metrics: Arc<ApiMetrics>) -> Self {
        Self { metrics }
    }
}

impl MetricsSink for PrometheusMetricsSink {
    fn match_started(&self, match_type: MatchType) {
        self.metrics
            .matches
            .get_or_create(&MatchLabels {
                match_type: match_type.as_str().to_string(),
                status: "started".to_string(),
            })
            .inc();
    }

    fn login_recorded(&self) {
        self.metrics.active_players_count.inc();
    }

    fn revenue_recorded(&self, item_type: &str, amount: f64) {
        self.metrics
            .revenue_usd
            .get_or_create(&ItemLabels {
                item_type: item_type.to_string(),
            })
            .inc_by(amount);
    }
}

/// Tracks request counts, latencies and in-flight totals for every route
/// except the exposition endpoint itself.
pub async fn track_requests(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    if endpoint == "/metrics" {
        return next.run(req).await;
    }

    let labels = EndpointLabels {
        method: method.clone(),
        endpoint: endpoint.clone(),
    };
    state
        .metrics
        .http_requests_in_progress
        .get_or_create(&labels)
        .inc();
    let start = Instant::now();

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    state
        .metrics
        .http_requests
        .get_or_create(&HttpLabels {
            method,
            endpoint,
            status: response.status().as_u16().to_string(),
        })
        .inc();
    state
        .metrics
        .http_request_duration_seconds
        .get_or_create(&labels)
        .observe(duration);
    state
        .metrics
        .http_requests_in_progress
        .get_or_create(&labels)
        .dec();

    response
}

pub async fn exposition(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let mut body = String::new();
    encode(&mut body, state.metrics.registry())
        .map_err(|e| ApiError::bad_request(format!("Failed to encode metrics: {}", e)))?;
    Ok((
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    ))
}
