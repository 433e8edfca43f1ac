//! Error and warning kinds raised while acquiring and summarizing content.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Fatal conditions. Every variant aborts the current invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Rate limit reached ({quota} requests/hour). Try again in {} minute(s).",
        retry_minutes(.retry_after)
    )]
    RateLimitExceeded { quota: usize, retry_after: Duration },

    #[error(transparent)]
    RemoteService(#[from] RemoteServiceError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("File not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("File too large: {} is {size} bytes, the limit is {limit} bytes", .path.display())]
    InputTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Failed to extract text from {}: {reason}", .path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("Unable to write rate limit history {}: {source}", .path.display())]
    History {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures talking to the summarization service.
#[derive(Debug, Error)]
pub enum RemoteServiceError {
    #[error("Rate limited by the summary service. Try again later.")]
    RateLimited,

    #[error("Summary service error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("No summary received from the summary service.")]
    EmptySummary,

    #[error("Summary request failed: {0}")]
    Request(#[source] reqwest::Error),
}

/// Failures obtaining raw content from the network or the browser.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Navigation to {url} timed out after {}s", .timeout.as_secs())]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to download {url} (HTTP {status})")]
    HttpStatus { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid proxy endpoint {endpoint}: {source}")]
    Proxy {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unable to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Browser configuration error: {0}")]
    BrowserConfig(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Unexpected browser result: {0}")]
    BrowserResult(String),

    #[error("Unable to buffer downloaded document: {0}")]
    TempFile(#[source] std::io::Error),
}

/// Non-fatal notices attached to acquired content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Extraction succeeded but produced fewer characters than expected.
    LowContent { chars: usize },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::LowContent { chars } => {
                write!(formatter, "extracted very little text ({chars} characters)")
            }
        }
    }
}

fn retry_minutes(retry_after: &Duration) -> String {
    format!("{:.0}", retry_after.as_secs_f64() / 60.0)
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
