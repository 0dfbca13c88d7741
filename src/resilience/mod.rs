//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (optional deadline on connect + response headers)
//!     → On expiry: ProxyError::deadline → 504
//! ```
//!
//! # Design Decisions
//! - Proxied calls are never retried: trading endpoints are not assumed
//!   idempotent
//! - Connect timeout is always on (hyper connector); the response deadline
//!   is opt-in because streaming responses can be long-lived

pub mod timeouts;
