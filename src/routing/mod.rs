//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (route lookup, table order)
//!     → matcher.rs (literal prefix test)
//!     → Return: matched Route (proxy) or None (static / SPA fallback)
//!
//! Route Compilation (at startup):
//!     RouteEntry[] for DEPLOY_ENV
//!     → Reject overlapping prefixes
//!     → Parse upstream targets
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins; overlap is impossible by construction

pub mod matcher;
pub mod router;

pub use router::{Route, RouteTable, Upstream};
