//! spa-edge binary.
//!
//! ```text
//! DEPLOY_ENV ─┐
//! PORT ───────┼─▶ config + overrides ─▶ route table ─▶ asset root ─▶ bind ─▶ serve
//! EDGE_CONFIG ┘                                                       ▲
//!                                              SIGINT / SIGTERM ──────┘ (drain)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use spa_edge::config::{load_config, ConfigurationError, EdgeConfig, Environment};
use spa_edge::http::EdgeServer;
use spa_edge::lifecycle::{self, signals, startup, Overrides, Shutdown};
use spa_edge::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "spa-edge", version)]
#[command(about = "Edge server: API proxy, static assets and SPA fallback", long_about = None)]
struct Cli {
    /// Deployment environment selecting the route table.
    #[arg(long = "env", env = "DEPLOY_ENV")]
    environment: Option<String>,

    /// Listening port.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// TOML configuration file; the built-in tables are used without one.
    #[arg(short, long, env = "EDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the built application.
    #[arg(long, env = "STATIC_ROOT")]
    static_root: Option<PathBuf>,

    /// Upstream response deadline in seconds (0 disables it).
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    upstream_timeout: Option<u64>,

    /// Validate configuration, print the selected route table and exit.
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            static_root: self.static_root.clone(),
            upstream_timeout_secs: self.upstream_timeout,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => load_config(path),
        None => Ok(EdgeConfig::default()),
    };
    let observability = loaded
        .as_ref()
        .map(|config| config.observability.clone())
        .unwrap_or_default();
    logging::init_logging(&observability);

    match run(cli, loaded).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "spa-edge failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, loaded: Result<EdgeConfig, ConfigurationError>) -> Result<(), Box<dyn std::error::Error>> {
    let config = loaded?;
    let environment = Environment::from_selector(cli.environment.as_deref());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %environment,
        "spa-edge starting"
    );

    let prepared = lifecycle::prepare(config, &environment, &cli.overrides())?;

    if cli.check {
        println!("{}", serde_json::to_string_pretty(&prepared.routes.describe())?);
        return Ok(());
    }

    let observability = &prepared.config.observability;
    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = startup::bind(&prepared.config.listener).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::forward_termination(shutdown));

    EdgeServer::new(&prepared.config, prepared.routes, prepared.assets)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
