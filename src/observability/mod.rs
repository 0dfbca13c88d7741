//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling produces:
//!     → logging.rs (structured log events with request_id)
//!     → metrics.rs (counters, gauges, histograms by outcome)
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line about a request
//! - Upstream error detail goes to logs only

pub mod logging;
pub mod metrics;
