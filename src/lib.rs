//! The gistify library turns a web page or a PDF into plain text, sends it to a
//! summary service, and composes the result into a Markdown document.

pub mod browser;
pub mod compose;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod pdf;
pub mod pipeline;
pub mod proxy;
pub mod rate_limit;
pub mod summarize;

use std::path::PathBuf;

use log::warn;

use crate::constants::LOW_CONTENT_CHARS;
use crate::error::Warning;

/// Enum representing how the command line overrides the proxy configuration.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ProxyOverride {
    /// Use a proxy even if the configuration file disables it.
    ForceOn,
    /// Never use a proxy.
    ForceOff,
    /// Follow the `enabled` flag of the configuration file.
    #[default]
    UseConfig,
}

impl ProxyOverride {
    /// Builds the override from the mutually exclusive `--proxy` / `--no-proxy` flags.
    #[must_use]
    pub fn from_flags(proxy: bool, no_proxy: bool) -> Self {
        match (proxy, no_proxy) {
            (true, _) => Self::ForceOn,
            (false, true) => Self::ForceOff,
            (false, false) => Self::UseConfig,
        }
    }
}

/// Enum representing what the user asked to summarize.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum InputTarget {
    /// An existing file on disk.
    LocalFile(PathBuf),
    /// Anything else, treated as a URL.
    RemoteUrl(String),
}

/// Plain text obtained from an input, ready for summarization.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AcquiredContent {
    /// The extracted text, trimmed.
    pub text: String,
    /// The page title, if the source has one.
    pub title: Option<String>,
    /// Where the text came from (`file://` URL for local files).
    pub source_url: String,
    /// Non-fatal notices raised during extraction.
    pub warnings: Vec<Warning>,
}

impl AcquiredContent {
    /// Wraps extracted text, flagging suspiciously short results.
    pub fn new(text: &str, title: Option<String>, source_url: impl Into<String>) -> Self {
        let text = text.trim().to_owned();
        let chars = text.chars().count();
        let mut warnings = Vec::new();

        if chars < LOW_CONTENT_CHARS {
            let warning = Warning::LowContent { chars };
            warn!("Warning: {warning}");
            warnings.push(warning);
        }

        Self {
            text,
            title: title
                .map(|title| title.trim().to_owned())
                .filter(|title| !title.is_empty()),
            source_url: source_url.into(),
            warnings,
        }
    }

    /// Returns `true` when extraction produced too little text to be trusted.
    #[must_use]
    pub fn is_low_content(&self) -> bool {
        self.warnings
            .iter()
            .any(|warning| matches!(warning, Warning::LowContent { .. }))
    }
}

pub use compose::{slugify, to_markdown};
pub use error::{Error, FetchError, RemoteServiceError};
pub use fetch::{DocumentFetcher, classify_input};
pub use pipeline::{AcquisitionPipeline, Gist};
pub use proxy::ProxyPool;
pub use rate_limit::RateLimiter;
pub use summarize::{SummaryClient, Summarizer};
