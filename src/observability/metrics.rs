//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by outcome, status
//! - `edge_request_duration_seconds` (histogram): handler latency by outcome
//! - `edge_websocket_tunnels_active` (gauge): open WebSocket tunnels
//!
//! Updates go through the `metrics` facade and are no-ops until a recorder
//! is installed with [`init_metrics`].

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Terminal state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Forwarded; upstream produced a response.
    Proxied,
    /// Upgrade forwarded; tunnel handed off.
    Tunnelled,
    /// Upstream unreachable, reset or past its deadline.
    UpstreamError,
    /// Upgrade on a route without WebSocket support.
    UpgradeRejected,
    /// Existing static asset served.
    Served,
    /// Entry document served for a client-side route.
    FallbackServed,
    /// Nothing to serve.
    NotFound,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Proxied => "proxied",
            Outcome::Tunnelled => "tunnelled",
            Outcome::UpstreamError => "upstream_error",
            Outcome::UpgradeRejected => "upgrade_rejected",
            Outcome::Served => "served",
            Outcome::FallbackServed => "fallback_served",
            Outcome::NotFound => "not_found",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(outcome: Outcome, status: u16, start: Instant) {
    metrics::counter!(
        "edge_requests_total",
        "outcome" => outcome.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("edge_request_duration_seconds", "outcome" => outcome.as_str())
        .record(start.elapsed().as_secs_f64());
}

/// Keeps the active-tunnel gauge raised while alive.
pub struct TunnelGuard(());

impl TunnelGuard {
    pub fn open() -> Self {
        metrics::gauge!("edge_websocket_tunnels_active").increment(1.0);
        Self(())
    }
}

impl Drop for TunnelGuard {
    fn drop(&mut self) {
        metrics::gauge!("edge_websocket_tunnels_active").decrement(1.0);
    }
}
