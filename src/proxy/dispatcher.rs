//! Forwarding of matched requests to the upstream.
//!
//! # Responsibilities
//! - Rewrite the path on the matched prefix
//! - Forward method, headers and body; rewrite `Host` on change-origin routes
//! - Hand WebSocket upgrades to the tunnel, reject other upgrades
//! - Stream the upstream response back without buffering it
//! - Turn upstream failures into generic 500/504 responses

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response, StatusCode, Version};
use axum::response::IntoResponse;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::http::request::request_id;
use crate::observability::metrics::Outcome;
use crate::proxy::error::{ProxyError, ProxyErrorKind};
use crate::proxy::websocket;
use crate::resilience::timeouts::{upstream_deadline, within};
use crate::routing::Route;
use crate::security::headers::{append_forwarded, strip_hop_by_hop};

/// Pooled upstream client plus the per-call deadline.
#[derive(Clone)]
pub struct ProxyDispatcher {
    client: Client<HttpConnector, Body>,
    deadline: Option<Duration>,
}

impl ProxyDispatcher {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.pool_idle_secs))
            .pool_max_idle_per_host(timeouts.pool_max_idle_per_host)
            .build(connector);

        Self {
            client,
            deadline: upstream_deadline(timeouts.upstream_secs),
        }
    }

    /// Forward `request` along `route`.
    pub async fn dispatch(
        &self,
        route: &Route,
        mut request: Request<Body>,
        peer: Option<SocketAddr>,
    ) -> (Outcome, Response<Body>) {
        let request_id = request_id(request.headers()).to_string();

        let upgrade = if websocket::is_upgrade_request(request.headers()) {
            if !route.allow_websocket() || !websocket::is_websocket(request.headers()) {
                tracing::warn!(
                    request_id = %request_id,
                    route = %route.prefix(),
                    "Upgrade requested on a route without WebSocket support"
                );
                return (Outcome::UpgradeRejected, websocket::reject_upgrade());
            }
            Some(websocket::client_upgrade(&mut request))
        } else {
            None
        };

        let upstream_request = match self.prepare(route, request, peer, upgrade.is_some()) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(request_id = %request_id, route = %route.prefix(), error = %e, "Failed to build upstream request");
                return (Outcome::UpstreamError, e.into_response());
            }
        };

        let result = match within(self.deadline, self.client.request(upstream_request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ProxyError::from_upstream(&e)),
            Err(elapsed) => Err(ProxyError::deadline(elapsed.limit)),
        };

        let mut response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    route = %route.prefix(),
                    upstream = %route.upstream().authority(),
                    kind = %e.kind,
                    error = %e.original_message,
                    "Upstream request failed"
                );
                return (Outcome::UpstreamError, e.into_response());
            }
        };

        if let Some(client_upgrade) = upgrade {
            if response.status() == StatusCode::SWITCHING_PROTOCOLS {
                let upstream_upgrade = hyper::upgrade::on(&mut response);
                websocket::spawn_tunnel(client_upgrade, upstream_upgrade, request_id, route.prefix().to_string());
                let (parts, _) = response.into_parts();
                return (Outcome::Tunnelled, Response::from_parts(parts, Body::empty()));
            }
            tracing::debug!(
                request_id = %request_id,
                status = %response.status(),
                "Upstream declined WebSocket upgrade"
            );
        }

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        (Outcome::Proxied, Response::from_parts(parts, Body::new(body)))
    }

    fn prepare(
        &self,
        route: &Route,
        request: Request<Body>,
        peer: Option<SocketAddr>,
        upgrade: bool,
    ) -> Result<Request<Body>, ProxyError> {
        let (mut parts, body) = request.into_parts();

        let original_host = parts
            .headers
            .get(header::HOST)
            .cloned()
            .or_else(|| parts.uri.authority().and_then(|a| HeaderValue::from_str(a.as_str()).ok()));

        parts.uri = route
            .upstream_uri(&parts.uri)
            .map_err(|e| ProxyError::new(ProxyErrorKind::Unknown, e.to_string()))?;
        parts.version = Version::HTTP_11;

        if !upgrade {
            strip_hop_by_hop(&mut parts.headers);
        }
        append_forwarded(&mut parts.headers, peer, original_host.clone());

        if route.change_origin() {
            parts.headers.insert(header::HOST, route.upstream().host_header().clone());
        } else if let Some(host) = original_host {
            parts.headers.insert(header::HOST, host);
        }

        let body = if upgrade { Body::empty() } else { body };
        Ok(Request::from_parts(parts, body))
    }
}
