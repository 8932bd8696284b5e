//! API Server
//!
//! Binds the router, applies the middleware stack and shuts down on signal.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::config::EngineConfig;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// HTTP front end for the settlement engine
pub struct ApiServer {
    config: EngineConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: EngineConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Start the API server and run until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        let addr = self.socket_addr()?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Roulette API listening on http://{}", addr);
        self.log_server_info();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API Server stopped gracefully");
        Ok(())
    }

    /// Router with the full middleware stack
    pub fn router(&self) -> axum::Router {
        build_app(self.state.clone(), &self.config)
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.api.host.parse::<std::net::IpAddr>()?,
            self.config.api.port,
        )))
    }

    fn log_server_info(&self) {
        info!("   CORS: {:?}", self.config.api.cors_origins);
        info!("   Request timeout: {}s", self.config.api.request_timeout_secs);
        info!("   Max wagers per spin: {}", self.config.settlement.max_wagers_per_spin);
        info!("   Initial balance: {}", self.config.ledger.initial_balance);
        info!("   Metrics enabled: {}", self.config.monitoring.enable_metrics);
        if let Some(seed) = self.config.wheel.seed {
            warn!("   Wheel seeded with {}; outcomes are reproducible", seed);
        }
    }
}

/// Router plus request-id, CORS, timeout and trace layers
pub fn build_app(state: Arc<AppState>, config: &EngineConfig) -> axum::Router {
    create_router(state)
        // Request ID middleware (first for tracing)
        .layer(axum::middleware::from_fn(request_id_middleware))
        // CORS layer (before timeout to handle preflight)
        .layer(create_cors_layer(config.api.cors_origins.clone()))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
