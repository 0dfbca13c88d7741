//! Upstream failure classification.
//!
//! A [`ProxyError`] carries the original cause for operator logs. The client
//! only ever sees a fixed status and a fixed body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;

/// Body sent to clients for any upstream failure.
pub const PROXY_ERROR_BODY: &str = "proxy server error";

/// Body sent to clients when the upstream deadline expires.
pub const PROXY_TIMEOUT_BODY: &str = "proxy server timeout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyErrorKind {
    ConnectionRefused,
    Timeout,
    UpstreamReset,
    Unknown,
}

impl ProxyErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyErrorKind::ConnectionRefused => "connection_refused",
            ProxyErrorKind::Timeout => "timeout",
            ProxyErrorKind::UpstreamReset => "upstream_reset",
            ProxyErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProxyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request upstream failure.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {original_message}")]
pub struct ProxyError {
    pub kind: ProxyErrorKind,
    pub original_message: String,
    deadline_exceeded: bool,
}

impl ProxyError {
    pub fn new(kind: ProxyErrorKind, original_message: impl Into<String>) -> Self {
        Self {
            kind,
            original_message: original_message.into(),
            deadline_exceeded: false,
        }
    }

    /// The operator-configured upstream deadline expired.
    pub fn deadline(limit: Duration) -> Self {
        Self {
            kind: ProxyErrorKind::Timeout,
            original_message: format!("upstream did not respond within {:?}", limit),
            deadline_exceeded: true,
        }
    }

    /// Classify an upstream client error by walking its source chain.
    pub fn from_upstream(err: &(dyn StdError + 'static)) -> Self {
        Self::new(classify(err), render_chain(err))
    }

    /// Status returned to the client.
    pub fn status(&self) -> StatusCode {
        if self.deadline_exceeded {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = if self.deadline_exceeded {
            PROXY_TIMEOUT_BODY
        } else {
            PROXY_ERROR_BODY
        };
        (self.status(), body).into_response()
    }
}

fn classify(err: &(dyn StdError + 'static)) -> ProxyErrorKind {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return match io_err.kind() {
                io::ErrorKind::ConnectionRefused => ProxyErrorKind::ConnectionRefused,
                io::ErrorKind::TimedOut => ProxyErrorKind::Timeout,
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => ProxyErrorKind::UpstreamReset,
                _ => ProxyErrorKind::Unknown,
            };
        }
        if let Some(hyper_err) = e.downcast_ref::<hyper::Error>() {
            if hyper_err.is_timeout() {
                return ProxyErrorKind::Timeout;
            }
            if hyper_err.is_incomplete_message() || hyper_err.is_canceled() || hyper_err.is_closed() {
                return ProxyErrorKind::UpstreamReset;
            }
        }
        current = e.source();
    }
    ProxyErrorKind::Unknown
}

fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        rendered.push_str(": ");
        rendered.push_str(&e.to_string());
        current = e.source();
    }
    rendered
}
