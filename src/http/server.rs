//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the single edge handler
//! - Wire up middleware (tracing, request ID, in-flight gate, body limit)
//! - Bind server to listener with upgrade support
//! - Dispatch each request to the proxy or the static asset server
//! - Record per-request metrics

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::EdgeConfig;
use crate::http::request::request_id;
use crate::http::static_files::StaticAssets;
use crate::observability::metrics;
use crate::proxy::ProxyDispatcher;
use crate::routing::RouteTable;
use crate::security::limits::{limit_in_flight, InFlightGate};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub dispatcher: ProxyDispatcher,
    pub assets: StaticAssets,
}

/// HTTP server for the edge.
pub struct EdgeServer {
    router: Router,
}

impl EdgeServer {
    /// Create a new server over an already-validated route table and asset
    /// root.
    pub fn new(config: &EdgeConfig, routes: RouteTable, assets: StaticAssets) -> Self {
        let state = AppState {
            routes: Arc::new(routes),
            dispatcher: ProxyDispatcher::new(&config.timeouts),
            assets,
        };

        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        let gate = InFlightGate::new(config.listener.max_in_flight);

        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(gate, limit_in_flight))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Edge handler: proxy if an API prefix matches, otherwise serve the SPA.
async fn edge_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (outcome, response) = match state.routes.match_path(&path) {
        Some(route) => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, route = %route.prefix(), "Proxying request");
            state.dispatcher.dispatch(route, request, Some(peer)).await
        }
        None => state.assets.serve(request).await,
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        outcome = outcome.as_str(),
        "Request complete"
    );
    metrics::record_request(outcome, response.status().as_u16(), start);
    response
}
