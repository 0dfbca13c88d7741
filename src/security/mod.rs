//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (in-flight gate, body size limit)
//!     → Pass to routing
//!
//! Proxied request / response:
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//! ```
//!
//! # Design Decisions
//! - Fail closed: shed load with 503 rather than queue unboundedly
//! - No trust in client-supplied hop-by-hop headers

pub mod headers;
pub mod limits;
