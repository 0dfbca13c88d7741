//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in tables (EdgeConfig::default) | config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI / environment overrides (PORT, STATIC_ROOT, ...)
//!     → validation.rs (semantic checks)
//!     → loader.rs selects the DEPLOY_ENV slice
//!     → RouteTable (validated, immutable)
//!     → shared via Arc to all request handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A missing or empty environment is a fatal error, never an empty table

pub mod environment;
pub mod loader;
pub mod schema;
pub mod validation;

pub use environment::Environment;
pub use loader::{load_config, load_route_table, ConfigurationError};
pub use schema::{
    EdgeConfig, EnvironmentConfig, ListenerConfig, LogFormat, ObservabilityConfig, RewriteRule,
    RouteEntry, StaticFilesConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
