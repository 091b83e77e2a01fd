//! Server state shared by every handler

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use fedlink_core::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::cache::{CacheStats, ResolutionCache};
use crate::error::Result;
use crate::planner::RedirectPlanner;
use crate::resolver::FederationResolver;

/// Everything a request needs: the planner (which owns the cache and the
/// federation table) plus the fixed redirects and pages
pub struct AppState {
    pub planner: RedirectPlanner,
    /// Target of `/`
    pub home_redirect: String,
    /// Target of `/about`
    pub about_redirect: String,
    /// Help page body, if one was loaded
    pub help_page: Option<Bytes>,
    /// Root of favicon, images, js and css
    pub static_dir: PathBuf,
    /// Set when the Prometheus exporter is installed
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state from config. The resolution cache starts empty.
    pub fn from_config(config: &Config) -> Result<Self> {
        let federation = Arc::new(config.federation());
        let cache = Arc::new(ResolutionCache::new());
        let resolver = FederationResolver::new(federation, cache, config.probe_timeout())?;

        Ok(Self {
            planner: RedirectPlanner::new(resolver, config.default_redirect_url()),
            home_redirect: config.home_redirect_url(),
            about_redirect: config.about_redirect_url(),
            help_page: None,
            static_dir: config.static_dir.clone(),
            prometheus: None,
        })
    }

    /// Read the help page into memory
    pub fn load_help_page(&mut self, path: &std::path::Path) -> Result<()> {
        let body = std::fs::read(path)?;
        tracing::info!(path = %path.display(), bytes = body.len(), "Help page loaded");
        self.help_page = Some(Bytes::from(body));
        Ok(())
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            cache: self.planner.cache().stats(),
            members: self.planner.federation().len(),
        }
    }
}

/// Cache and federation sizes for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct ServerStats {
    pub cache: CacheStats,
    pub members: usize,
}

/// Shared server state type
pub type SharedState = Arc<AppState>;

/// Create shared state from config
pub fn create_shared_state(config: &Config) -> Result<SharedState> {
    Ok(Arc::new(AppState::from_config(config)?))
}
