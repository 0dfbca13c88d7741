//! Startup orchestration.
//!
//! # Responsibilities
//! - Apply CLI / environment overrides to the loaded configuration
//! - Validate configuration and select the environment's route table
//! - Check the static asset root and entry document
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::path::PathBuf;
use tokio::net::TcpListener;

use crate::config::{
    load_route_table, validate_config, ConfigurationError, EdgeConfig, Environment, ListenerConfig,
};
use crate::http::StaticAssets;
use crate::routing::RouteTable;

/// Values supplied on the command line or through the environment, which
/// take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub static_root: Option<PathBuf>,
    pub upstream_timeout_secs: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, config: &mut EdgeConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(root) = &self.static_root {
            config.static_files.root = root.clone();
        }
        if let Some(secs) = self.upstream_timeout_secs {
            config.timeouts.upstream_secs = secs;
        }
    }
}

/// Everything the server needs, checked.
pub struct Prepared {
    pub config: EdgeConfig,
    pub routes: RouteTable,
    pub assets: StaticAssets,
}

/// Validate `config` for `environment`. Nothing is bound yet.
pub fn prepare(
    mut config: EdgeConfig,
    environment: &Environment,
    overrides: &Overrides,
) -> Result<Prepared, ConfigurationError> {
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigurationError::Validation)?;

    let routes = load_route_table(&config, environment)?;
    for route in routes.entries() {
        tracing::info!(
            environment = %environment,
            prefix = %route.path_prefix,
            target = %route.target,
            websocket = route.websocket,
            "Route loaded"
        );
    }

    let assets = StaticAssets::new(&config.static_files)?;
    tracing::info!(
        root = %assets.root().display(),
        entry = %config.static_files.entry_document,
        "Static assets ready"
    );

    Ok(Prepared { config, routes, assets })
}

/// Bind the listening socket.
pub async fn bind(listener: &ListenerConfig) -> Result<TcpListener, ConfigurationError> {
    let address = listener.bind_address();
    TcpListener::bind(&address)
        .await
        .map_err(|source| ConfigurationError::Bind { address, source })
}
