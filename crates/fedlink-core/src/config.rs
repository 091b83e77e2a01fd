//! Service configuration
//!
//! Loaded once at startup from a JSON file:
//!
//! ```json
//! {
//!   "host": { "su92l": "cloud.example.org", "tordo": "tordo.example.org" },
//!   "default_redirect": "landing.example.org",
//!   "port": "8080"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::federation::{normalize_base_url, FederationTable};
use crate::Error;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "fedlink.json";

pub const DEFAULT_PORT: u16 = 80;

pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

/// Port given either as a JSON string or number
#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

fn deserialize_port<'de, D>(d: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match PortValue::deserialize(d)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

fn default_help_page() -> Option<PathBuf> {
    Some(PathBuf::from("html/help.html"))
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// Configuration for the link resolver service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host token -> federation member host (bare host name or URL)
    #[serde(default)]
    pub host: BTreeMap<String, String>,
    /// Fallback host for anything that cannot be resolved
    pub default_redirect: String,
    /// Listen port
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,
    /// Per-probe timeout when contacting federation members
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Target of `/` (defaults to the fallback host)
    #[serde(default)]
    pub home_redirect: Option<String>,
    /// Target of `/about` (defaults to `<home>/about`)
    #[serde(default)]
    pub about_redirect: Option<String>,
    /// Help page served at `/help`
    #[serde(default = "default_help_page")]
    pub help_page: Option<PathBuf>,
    /// Directory holding favicon, images, js and css
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Config {
    /// Minimal configuration with no federation members
    pub fn new(default_redirect: impl Into<String>) -> Self {
        Self {
            host: BTreeMap::new(),
            default_redirect: default_redirect.into(),
            port: DEFAULT_PORT,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            home_redirect: None,
            about_redirect: None,
            help_page: default_help_page(),
            static_dir: default_static_dir(),
        }
    }

    /// Add a federation member
    pub fn with_host(mut self, host_token: impl Into<String>, host: impl Into<String>) -> Self {
        self.host.insert(host_token.into(), host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Check host tokens and the fallback host
    pub fn validate(&self) -> crate::Result<()> {
        if self.default_redirect.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "default_redirect must not be empty".to_string(),
            ));
        }

        for (token, host) in &self.host {
            let well_formed = token.len() == 5
                && token
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
            if !well_formed {
                return Err(Error::InvalidHostToken {
                    token: token.clone(),
                    reason: "expected 5 characters of [a-z0-9]".to_string(),
                });
            }
            if host.trim().is_empty() {
                return Err(Error::InvalidHostToken {
                    token: token.clone(),
                    reason: "host must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Federation member table derived from `host`
    pub fn federation(&self) -> FederationTable {
        self.host
            .iter()
            .map(|(token, host)| (token.clone(), host.clone()))
            .collect()
    }

    /// Normalized fallback base URL
    pub fn default_redirect_url(&self) -> String {
        normalize_base_url(&self.default_redirect)
    }

    /// Target of `/`
    pub fn home_redirect_url(&self) -> String {
        match &self.home_redirect {
            Some(home) => normalize_base_url(home),
            None => self.default_redirect_url(),
        }
    }

    /// Target of `/about`
    pub fn about_redirect_url(&self) -> String {
        match &self.about_redirect {
            Some(about) => normalize_base_url(about),
            None => format!("{}/about", self.home_redirect_url()),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
