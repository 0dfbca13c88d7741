//! Header manipulation for proxied requests.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers on both legs
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//! - Rewrite `Host` when a route changes origin
//!
//! # Design Decisions
//! - Existing X-Forwarded-For is appended to, not replaced
//! - Headers named in `Connection` are treated as hop-by-hop too
//! - Upgrade requests keep `Connection`/`Upgrade` so the handshake reaches
//!   the upstream

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use std::net::SocketAddr;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
const PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");

/// Headers meaningful only for a single transport-level connection.
fn hop_by_hop() -> [HeaderName; 9] {
    [
        header::CONNECTION,
        KEEP_ALIVE,
        PROXY_CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ]
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(hop_by_hop().iter()) {
        headers.remove(name);
    }
}

/// Append the client address and original host/proto for the upstream.
pub fn append_forwarded(headers: &mut HeaderMap, client: Option<SocketAddr>, original_host: Option<HeaderValue>) {
    if let Some(addr) = client {
        let ip = addr.ip().to_string();
        let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{}, {}", existing, ip),
            None => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    if !headers.contains_key(&X_FORWARDED_PROTO) {
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
    }

    if let Some(host) = original_host {
        if !headers.contains_key(&X_FORWARDED_HOST) {
            headers.insert(X_FORWARDED_HOST, host);
        }
    }
}
