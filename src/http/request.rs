//! Request identification.
//!
//! Every request gets an `x-request-id` (UUID v4 unless the client sent
//! one). It is forwarded upstream, echoed on the response and attached to
//! every log line about the request.

use axum::http::{HeaderMap, HeaderName};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request ID set by the request-id layer, or `"unknown"` outside it.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
