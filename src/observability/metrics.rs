//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (RPS, latency, cache outcomes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `catalog_requests_total` (counter): requests by method, route, status
//! - `catalog_request_duration_seconds` (histogram): latency distribution
//! - `catalog_response_cache_lookups_total` (counter): hit / miss / bypass / error
//! - `catalog_response_cache_entries` (gauge): stored responses
//! - `catalog_conditional_responses_total` (counter): fresh vs not-modified
//! - `catalog_unknown_visibility_group_total` (counter): projections that exposed nothing
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Outcome of a response-cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    Bypass,
    Error,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::Bypass => "bypass",
            CacheOutcome::Error => "error",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(
            address = %addr,
            error = %e,
            "Failed to install metrics exporter"
        ),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "catalog_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "catalog_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(outcome: CacheOutcome) {
    counter!("catalog_response_cache_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("catalog_response_cache_entries").set(entries as f64);
}

pub fn record_conditional(not_modified: bool) {
    let result = if not_modified { "not_modified" } else { "fresh" };
    counter!("catalog_conditional_responses_total", "result" => result).increment(1);
}

pub fn record_unknown_group(kind: &'static str) {
    counter!("catalog_unknown_visibility_group_total", "kind" => kind).increment(1);
}

/// Middleware recording request count and latency per matched route.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start);
    response
}
