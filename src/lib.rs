//! Edge server for the trading admin single-page application.
//!
//! One process, three jobs:
//! - proxy API prefixes (and WebSocket upgrades) to the upstream selected by
//!   `DEPLOY_ENV`,
//! - serve the built application from the static asset root,
//! - answer every other browser navigation with the entry document so the
//!   client-side router can take over.
//!
//! ```text
//! request → routing::RouteTable::match_path
//!             ├─ Some(route) → proxy::ProxyDispatcher → upstream
//!             └─ None        → http::StaticAssets → file | entry document | 404
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::{ConfigurationError, EdgeConfig, Environment};
pub use http::EdgeServer;
pub use lifecycle::Shutdown;
