//! Router assembly and the serve loop

use crate::routes::{self, AppState};
use crate::shutdown::Shutdown;
use crate::ws;
use axum::Router;
use axum::routing::{any, get};
use enslite_core::config::GatewayConfig;
use enslite_core::{ResolutionService, Result, SyncProgressHub};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP + WebSocket gateway
///
/// ## Lifecycle
///
/// 1. Create with [`Gateway::new()`]
/// 2. Hand [`Gateway::shutdown()`] to anything that may stop the process
/// 3. Run with [`Gateway::serve()`] until shutdown is triggered
pub struct Gateway {
    state: AppState,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(
        service: Arc<ResolutionService>,
        hub: Arc<SyncProgressHub>,
        config: GatewayConfig,
    ) -> Self {
        let shutdown = Shutdown::new(service.clone(), hub.clone());
        let state = AppState {
            service,
            hub,
            shutdown,
            relay_client_messages: config.relay_client_messages,
        };
        Self { state, config }
    }

    /// Shutdown handle shared with the stop endpoint
    pub fn shutdown(&self) -> Shutdown {
        self.state.shutdown.clone()
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config.ws_path)
    }

    /// Bind the configured listen address
    pub async fn bind(&self) -> Result<TcpListener> {
        Ok(TcpListener::bind(self.config.listen_addr).await?)
    }

    /// Serve on `listener` until shutdown is triggered
    ///
    /// In-flight requests finish before this returns.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr: SocketAddr = listener.local_addr()?;
        info!("Gateway listening on http://{} (stream at {})", addr, self.config.ws_path);

        let shutdown_rx = self.state.shutdown.subscribe();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(Shutdown::wait(shutdown_rx))
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}

/// Build the router over `state`
///
/// The whole `/resolver` prefix goes to one handler so `POST` anywhere
/// under it reaches the shutdown path.
pub fn build_router(state: AppState, ws_path: &str) -> Router {
    Router::new()
        .route("/resolver", any(routes::resolver_root))
        .route("/resolver/*path", any(routes::resolver))
        .route(ws_path, get(ws::upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
