//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve, HTTP/1.1 + upgrades, HTTP/2)
//!     → server.rs (middleware: request ID, trace, in-flight gate, body limit)
//!     → routing (API prefix?)
//!         ├─ yes → proxy dispatcher
//!         └─ no  → static_files.rs (asset, else entry document for GET)
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod static_files;

pub use request::X_REQUEST_ID;
pub use server::EdgeServer;
pub use static_files::StaticAssets;
