//! HTTP API server implementation

use crate::api::routes;
use crate::app::AppState;
use anyhow::{Context, Result};
use axum::Router;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// HTTP API server
pub struct ApiServer {
    app: Router,
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: Arc<AppState>) -> Result<Self> {
        let config = &state.config;

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .context("Invalid server host/port configuration")?;

        let mut app = routes::create_routes().with_state(state.clone());

        if config.logging.request_logging {
            app = app.layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            );
        }

        app = app.layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )));

        if config.server.cors_enabled {
            app = app.layer(CorsLayer::permissive());
        }

        info!("API server configured for {}", addr);

        Ok(Self {
            app,
            addr,
            shutdown: CancellationToken::new(),
        })
    }

    /// Serve until [`ApiServer::shutdown`] is called
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .context("Failed to bind to server address")?;

        info!("API server listening on {}", self.addr);

        axum::serve(listener, self.app.clone())
            .with_graceful_shutdown(self.shutdown.clone().cancelled_owned())
            .await
            .context("API server error")?;

        info!("API server stopped");
        Ok(())
    }

    /// Stop accepting connections and drain the open ones
    pub fn shutdown(&self) {
        info!("API server shutdown initiated");
        self.shutdown.cancel();
    }
}
