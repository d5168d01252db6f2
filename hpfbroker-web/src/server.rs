//! HPFBroker management server
//!
//! Binds the HTTP listener and serves the API until shutdown.

use crate::{create_app, AppState, WebError, WebResult};
use hpfbroker_core::BrokerConfig;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

pub struct BrokerServer {
    state: AppState,
}

impl BrokerServer {
    /// Open the store, seed the bootstrap administrator and build the state
    pub async fn new(config: BrokerConfig) -> WebResult<Self> {
        let state = AppState::new(config).await?;
        state.bootstrap_admin().await?;
        Ok(Self { state })
    }

    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bind the configured address and serve until ctrl-c
    pub async fn start(self) -> WebResult<()> {
        let listener = TcpListener::bind(&self.state.config.http.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> WebResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address: SocketAddr = listener.local_addr()?;
        info!(
            feed = %self.state.config.hpfeeds.name,
            feed_port = self.state.config.hpfeeds.port,
            "Management API listening on http://{}",
            address
        );

        let app = create_app(self.state);

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
