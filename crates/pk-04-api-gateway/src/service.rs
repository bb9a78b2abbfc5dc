//! Gateway service: binds the listener and serves the router until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use crate::domain::error::GatewayError;
use crate::router::{build_router, AppState};
use pk_02_notifications::ConnectionRegistry;

/// API Gateway service state
pub struct ApiGatewayService {
    state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_rx: Option<oneshot::Receiver<()>>,
}

impl ApiGatewayService {
    /// Validates the configuration carried by `state`.
    pub fn new(state: AppState) -> Result<Self, GatewayError> {
        state.config.validate()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        Ok(Self {
            state,
            shutdown_tx: Some(shutdown_tx),
            shutdown_rx: Some(shutdown_rx),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.state.config.http_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))
    }

    /// Serve on `listener` until [`shutdown`](Self::shutdown) is called or
    /// the [`shutdown_handle`](Self::shutdown_handle) fires. Serves once.
    pub async fn serve(&mut self, listener: TcpListener) -> Result<(), GatewayError> {
        let shutdown_rx = self
            .shutdown_rx
            .take()
            .ok_or_else(|| GatewayError::Internal("gateway already served".into()))?;

        let local: Option<SocketAddr> = listener.local_addr().ok();
        info!(
            addr = ?local,
            websocket = self.state.config.websocket.enabled,
            environment = ?self.state.config.environment,
            "Starting API gateway"
        );

        let router = build_router(self.state.clone());
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Received shutdown signal");
            })
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("API gateway stopped");
        Ok(())
    }

    /// Bind and serve.
    pub async fn start(&mut self) -> Result<(), GatewayError> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Sender that stops [`serve`](Self::serve). Taken once.
    pub fn shutdown_handle(&mut self) -> Option<oneshot::Sender<()>> {
        self.shutdown_tx.take()
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
