//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router whose fallback feeds every request to the Mux
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Stop gracefully on Ctrl+C or a shutdown broadcast

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::bun::make_bun_mux;
use crate::config::BunConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::signals::shutdown_signal;
use crate::routing::Mux;

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub mux: Arc<Mux>,
}

/// HTTP server for the diagnostic endpoints.
#[derive(Debug)]
pub struct HttpServer {
    router: Router,
    config: BunConfig,
}

impl HttpServer {
    /// Create a server with the standard endpoint table.
    pub fn new(config: BunConfig) -> Self {
        let mux = Arc::new(make_bun_mux(&config));
        Self::with_mux(config, mux)
    }

    /// Create a server around an already populated Mux.
    pub fn with_mux(config: BunConfig, mux: Arc<Mux>) -> Self {
        let router = Self::build_router(&config, AppState { mux });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BunConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The service, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path_prefix = %self.config.routing.path_prefix,
            allowed_hosts = ?self.config.routing.allowed_hosts,
            force_https = self.config.routing.force_https,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BunConfig {
        &self.config
    }
}

/// Fallback handler: every request goes through the Mux.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    // TLS is terminated upstream, so the connection itself is never encrypted.
    state.mux.dispatch(request, peer, false).await
}
