//! Link resolver server

use std::net::SocketAddr;
use std::path::Path;

use fedlink_core::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;

use crate::error::{Result, ServerError};
use crate::metrics;
use crate::routes::create_router;
use crate::state::{AppState, SharedState};

/// Link resolver server
pub struct FedlinkServer {
    state: SharedState,
    addr: SocketAddr,
}

impl FedlinkServer {
    /// Run the server on its configured address until Ctrl-C
    pub async fn run(self) -> Result<()> {
        tracing::info!("Starting fedlink server on {}", self.addr);

        let listener = TcpListener::bind(self.addr).await?;
        Self::serve(self.state, listener).await
    }

    /// Serve on an already bound listener until Ctrl-C
    pub async fn serve(state: SharedState, listener: TcpListener) -> Result<()> {
        let router = create_router(state);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the server state for testing
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Builder for FedlinkServer
pub struct ServerBuilder {
    config: Config,
    addr: SocketAddr,
    load_help_page: bool,
    prometheus: Option<PrometheusHandle>,
}

impl ServerBuilder {
    pub fn new(config: Config) -> Self {
        let addr = ([0, 0, 0, 0], config.port).into();
        Self {
            config,
            addr,
            load_help_page: true,
            prometheus: None,
        }
    }

    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.addr = ([0, 0, 0, 0], port).into();
        self
    }

    /// Skip reading the help page on build (useful for testing)
    pub fn skip_help_page(mut self) -> Self {
        self.load_help_page = false;
        self
    }

    /// Serve Prometheus metrics from `/metrics`
    pub fn prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn build(self) -> Result<FedlinkServer> {
        self.config.validate()?;

        let default_redirect = self.config.default_redirect_url();
        let federation = self.config.federation();
        for member in federation.members() {
            tracing::info!(host = %member.host_token, url = %member.base_url, "Host mapping");
        }
        tracing::info!(default_redirect = %default_redirect, "Default redirect");
        metrics::set_federation_members(federation.len());

        let mut state = AppState::from_config(&self.config)?;

        if self.load_help_page {
            if let Some(path) = self.config.help_page.as_ref() {
                load_help_page_or_warn(&mut state, path);
            }
        }

        if let Some(handle) = self.prometheus {
            state = state.with_prometheus(handle);
        }

        Ok(FedlinkServer {
            state: std::sync::Arc::new(state),
            addr: self.addr,
        })
    }
}

/// A missing help page only disables `/help`
fn load_help_page_or_warn(state: &mut AppState, path: &Path) {
    if let Err(e) = state.load_help_page(path) {
        tracing::warn!(path = %path.display(), error = %e, "Help page not loaded");
    }
}
