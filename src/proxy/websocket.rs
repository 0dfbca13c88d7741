//! WebSocket tunnelling.
//!
//! # Responsibilities
//! - Detect upgrade requests
//! - Forward the handshake to the upstream unchanged
//! - Once both sides switch protocols, relay raw bytes until either closes
//!
//! # Data Flow
//! ```text
//! Client ←──── upgraded socket ────→ Edge ←──── upgraded socket ────→ Upstream
//!                       tokio::io::copy_bidirectional
//! ```
//!
//! # Design Decisions
//! - Byte-level relay: frames, pings and close frames pass through untouched
//! - Byte order is preserved per direction
//! - The tunnel task owns both sockets; it ends when either side closes

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Response, StatusCode};
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;

use crate::observability::metrics;

/// True when the request asks for a protocol switch.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));
    connection_upgrade && headers.contains_key(header::UPGRADE)
}

/// True when the requested protocol is WebSocket.
pub fn is_websocket(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("websocket"))
        .unwrap_or(false)
}

/// Relay bytes between the two upgraded connections until either closes.
///
/// Spawned after the upstream answered `101 Switching Protocols`; the
/// client-side upgrade completes once that response has been written.
pub fn spawn_tunnel(client: OnUpgrade, upstream: OnUpgrade, request_id: String, route: String) {
    tokio::spawn(async move {
        let (client_io, upstream_io) = match tokio::try_join!(client, upstream) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(request_id = %request_id, route = %route, error = %e, "WebSocket upgrade failed");
                return;
            }
        };

        let mut client_io = TokioIo::new(client_io);
        let mut upstream_io = TokioIo::new(upstream_io);
        let _active = metrics::TunnelGuard::open();

        tracing::debug!(request_id = %request_id, route = %route, "WebSocket tunnel established");
        match tokio::io::copy_bidirectional(&mut client_io, &mut upstream_io).await {
            Ok((from_client, from_upstream)) => {
                tracing::debug!(
                    request_id = %request_id,
                    route = %route,
                    from_client,
                    from_upstream,
                    "WebSocket tunnel closed"
                );
            }
            Err(e) => {
                tracing::debug!(request_id = %request_id, route = %route, error = %e, "WebSocket tunnel aborted");
            }
        }
    });
}

/// Response for an upgrade request on a route that does not allow one.
pub fn reject_upgrade() -> Response<Body> {
    let mut response = Response::new(Body::from("upgrade not allowed on this route"));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}

/// Take the client's pending upgrade out of the request.
pub fn client_upgrade(request: &mut Request<Body>) -> OnUpgrade {
    hyper::upgrade::on(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn detects_websocket_upgrade() {
        let h = headers(&[("connection", "keep-alive, Upgrade"), ("upgrade", "WebSocket")]);
        assert!(is_upgrade_request(&h));
        assert!(is_websocket(&h));
    }

    #[test]
    fn upgrade_header_alone_is_not_an_upgrade() {
        let h = headers(&[("upgrade", "websocket")]);
        assert!(!is_upgrade_request(&h));
    }

    #[test]
    fn other_protocols_are_not_websocket() {
        let h = headers(&[("connection", "upgrade"), ("upgrade", "h2c")]);
        assert!(is_upgrade_request(&h));
        assert!(!is_websocket(&h));
    }

    #[test]
    fn rejection_is_bad_request() {
        assert_eq!(reject_upgrade().status(), StatusCode::BAD_REQUEST);
    }
}
