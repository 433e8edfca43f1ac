//! The proxy module picks an outbound proxy endpoint for every request.
//!
//! The configuration file is re-read on each selection so that edits made while
//! the tool runs take effect on the next request.

use std::path::{Path, PathBuf};

use log::debug;
use rand::seq::SliceRandom;
use reqwest::ClientBuilder;
use serde::Deserialize;

use crate::ProxyOverride;
use crate::error::FetchError;

/// Contents of the proxy configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub proxies: Vec<String>,
}

impl ProxyConfig {
    /// Reads the configuration, falling back to a disabled, empty pool when the
    /// file is absent or malformed.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                debug!("No proxy configuration at {}: {err}", path.display());
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|err| {
            debug!("Ignoring malformed proxy configuration {}: {err}", path.display());
            Self::default()
        })
    }

    /// Distinct, non-blank endpoints in configuration order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<&str> {
        let mut endpoints: Vec<&str> = Vec::with_capacity(self.proxies.len());
        for endpoint in self.proxies.iter().map(|proxy| proxy.trim()) {
            if !endpoint.is_empty() && !endpoints.contains(&endpoint) {
                endpoints.push(endpoint);
            }
        }
        endpoints
    }
}

/// Selects a proxy endpoint per request from the configured pool.
#[derive(Debug, Clone)]
pub struct ProxyPool {
    config_path: PathBuf,
    override_mode: ProxyOverride,
}

impl ProxyPool {
    pub fn new(config_path: impl Into<PathBuf>, override_mode: ProxyOverride) -> Self {
        Self {
            config_path: config_path.into(),
            override_mode,
        }
    }

    /// A pool that never selects a proxy.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), ProxyOverride::ForceOff)
    }

    /// Picks one endpoint uniformly at random, or `None` when proxies are
    /// disabled or none are configured.
    #[must_use]
    pub fn select_endpoint(&self) -> Option<String> {
        if self.override_mode == ProxyOverride::ForceOff {
            return None;
        }

        let config = ProxyConfig::load(&self.config_path);
        let enabled = match self.override_mode {
            ProxyOverride::ForceOn => true,
            ProxyOverride::ForceOff => false,
            ProxyOverride::UseConfig => config.enabled,
        };
        if !enabled {
            return None;
        }

        config
            .endpoints()
            .choose(&mut rand::thread_rng())
            .map(|endpoint| (*endpoint).to_owned())
    }

    /// Routes every request of the client being built through a freshly
    /// selected endpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected endpoint is not a valid proxy URL.
    pub fn apply(&self, builder: ClientBuilder) -> Result<ClientBuilder, FetchError> {
        let Some(endpoint) = self.select_endpoint() else {
            return Ok(builder);
        };

        debug!("Using proxy {endpoint}");
        let proxy = reqwest::Proxy::all(&endpoint)
            .map_err(|source| FetchError::Proxy { endpoint, source })?;

        Ok(builder.proxy(proxy))
    }
}
