//! The config module resolves file locations and endpoints from environment
//! overrides and per-user defaults.

use std::env;
use std::path::PathBuf;

use log::debug;

use crate::constants::{
    API_URL_ENV_NAME, APP_DIR_NAME, CHROME_PATH_ENV_NAME, DEFAULT_API_URL, DEFAULT_OUTPUT_DIR,
    DEFAULT_PROXY_CONFIG_FILE, DEFAULT_RATE_LIMIT_FILE, OUTPUT_DIR_ENV_NAME, PROXY_CONFIG_ENV_NAME,
    RATE_LIMIT_FILE_ENV_NAME,
};

/// Locations and endpoints used by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Summary service endpoint.
    pub api_url: String,
    /// Rate limit history file.
    pub history_path: PathBuf,
    /// Proxy configuration file.
    pub proxy_config_path: PathBuf,
    /// Directory for generated documents when no output path is given.
    pub output_dir: PathBuf,
    /// Browser executable; auto-detected when absent.
    pub chrome_executable: Option<PathBuf>,
}

impl Settings {
    /// Reads the settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let settings = Self {
            api_url: lookup(API_URL_ENV_NAME).unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            history_path: lookup(RATE_LIMIT_FILE_ENV_NAME)
                .map(PathBuf::from)
                .unwrap_or_else(default_history_path),
            proxy_config_path: lookup(PROXY_CONFIG_ENV_NAME)
                .map(PathBuf::from)
                .unwrap_or_else(default_proxy_config_path),
            output_dir: PathBuf::from(
                lookup(OUTPUT_DIR_ENV_NAME).unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_owned()),
            ),
            chrome_executable: lookup(CHROME_PATH_ENV_NAME).map(PathBuf::from),
        };

        debug!("Resolved settings: {settings:?}");
        settings
    }
}

fn default_history_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_default()
        .join(APP_DIR_NAME)
        .join(DEFAULT_RATE_LIMIT_FILE)
}

fn default_proxy_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(DEFAULT_PROXY_CONFIG_FILE)
}
