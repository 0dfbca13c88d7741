//! Proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Matched Route + Request
//!     → dispatcher.rs (rewrite path, forward headers/body)
//!         ├─ Upgrade: websocket on a WebSocket route
//!         │     → websocket.rs (101 passthrough, byte tunnel)
//!         ├─ Upgrade on any other route → 400
//!         └─ Plain request → pooled hyper client → streamed response
//!     → error.rs (upstream failure → generic 500 / 504)
//! ```
//!
//! # Design Decisions
//! - Responses stream straight through; no body buffering
//! - Upstream causes are logged, never returned to the client
//! - Client disconnect drops the upstream call

pub mod dispatcher;
pub mod error;
pub mod websocket;

pub use dispatcher::ProxyDispatcher;
pub use error::{ProxyError, ProxyErrorKind};
