//! Claims gateway service - binds the HTTP listener and serves the router
//! until a shutdown signal resolves.

use axum::Router;
use claim_verification::ClaimVerificationApi;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use crate::domain::{GatewayConfig, GatewayError};
use crate::router::build_router;

/// HTTP gateway in front of the verification workflow.
pub struct ClaimsGateway {
    config: GatewayConfig,
    claims: Arc<dyn ClaimVerificationApi>,
}

impl ClaimsGateway {
    /// Create a gateway; fails on invalid configuration.
    pub fn new(
        config: GatewayConfig,
        claims: Arc<dyn ClaimVerificationApi>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;
        Ok(Self { config, claims })
    }

    /// Router with the full middleware stack.
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.claims), self.config.request_timeout())
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.config.http_addr;
        TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().map_err(GatewayError::Serve)?;
        info!(addr = %addr, "Claims gateway listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(GatewayError::Serve)?;
        info!("Claims gateway stopped");
        Ok(())
    }

    /// Spawn the server on a background task.
    pub async fn spawn(self) -> Result<RunningGateway, GatewayError> {
        let listener = self.bind().await?;
        let addr = listener.local_addr().map_err(GatewayError::Serve)?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(self.serve_on(listener, async move {
            let _ = shutdown_rx.await;
        }));
        Ok(RunningGateway {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }
}

/// Handle to a gateway spawned with [`ClaimsGateway::spawn`].
pub struct RunningGateway {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<Result<(), GatewayError>>,
}

impl RunningGateway {
    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn shutdown(mut self) -> Result<(), GatewayError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(GatewayError::Serve(std::io::Error::other(e.to_string()))),
        }
    }
}
