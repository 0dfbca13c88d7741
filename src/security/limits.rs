//! Request admission limits.
//!
//! The in-flight gate is sized once at startup from
//! `listener.max_in_flight`; requests beyond it are shed with 503 instead of
//! queueing behind slow upstreams.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared permit pool bounding concurrent requests.
#[derive(Debug, Clone)]
pub struct InFlightGate {
    permits: Arc<Semaphore>,
}

impl InFlightGate {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
        }
    }
}

/// Middleware holding one permit for the duration of the handler.
pub async fn limit_in_flight(State(gate): State<InFlightGate>, request: Request, next: Next) -> Response {
    match gate.permits.clone().try_acquire_owned() {
        Ok(_permit) => next.run(request).await,
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "In-flight limit reached, shedding request");
            (StatusCode::SERVICE_UNAVAILABLE, "server busy").into_response()
        }
    }
}
