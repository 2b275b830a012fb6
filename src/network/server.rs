//! HTTP Server
//!
//! Binds the listener, serves the router and flushes the store on shutdown.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;

use crate::config::Config;
use crate::error::{ConfkvError, Result};
use crate::service::ConfigService;
use crate::store::open_store;

use super::routes::{create_router, AppState};

/// HTTP server for confkv
pub struct Server {
    config: Config,
    state: Arc<AppState>,
}

impl Server {
    /// Open the configured store and build a server around it
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let service = ConfigService::new(open_store(&config)?);
        Ok(Self::with_service(config, service))
    }

    /// Build a server around an existing service
    pub fn with_service(config: Config, service: ConfigService) -> Self {
        let state = Arc::new(AppState::new(service, config.max_body_bytes));
        Self { config, state }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Bind `listen_addr` and serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "confkv server listening");

        let router = create_router(Arc::clone(&self.state));
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        // Pending writes must reach disk before the process exits
        let service = self.state.service.clone();
        tokio::task::spawn_blocking(move || service.flush())
            .await
            .map_err(|e| ConfkvError::Task(e.to_string()))??;

        tracing::info!("confkv server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        () = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
