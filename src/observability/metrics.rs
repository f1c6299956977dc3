//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, status, branch
//! - `edge_request_duration_seconds` (histogram): latency by branch
//! - `edge_rate_limited_total` (counter): rejected requests by reason
//! - `edge_hook_failures_total` (counter): failed hooks by stage
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users
//!   and tests pay nothing
//! - Request metrics are recorded by an after-hook, which sees every branch

use std::net::SocketAddr;
use std::time::Instant;

use futures_util::future::BoxFuture;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::http::exchange::Exchange;
use crate::http::hooks::Hook;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, branch: &str, start: Instant) {
    metrics::counter!(
        "edge_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "branch" => branch.to_string()
    )
    .increment(1);
    metrics::histogram!("edge_request_duration_seconds", "branch" => branch.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(reason: &'static str) {
    metrics::counter!("edge_rate_limited_total", "reason" => reason).increment(1);
}

pub fn record_hook_failure(stage: &'static str) {
    metrics::counter!("edge_hook_failures_total", "stage" => stage).increment(1);
}

/// After-hook that records one request sample per exchange.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsHook;

impl Hook for MetricsHook {
    fn run<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let status = exchange.response().map(|r| r.status().as_u16()).unwrap_or(500);
            let branch = exchange.branch().map(|b| b.as_str()).unwrap_or("none");
            record_request(exchange.method().as_str(), status, branch, exchange.started());
            Ok(())
        })
    }
}
