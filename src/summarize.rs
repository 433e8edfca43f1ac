//! The summarize module sends extracted text to the summary service and
//! returns the summary it produces.

use std::time::Duration;

use async_trait::async_trait;
use log::info;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::constants::SUMMARY_TIMEOUT_SECS;
use crate::error::{Error, FetchError, RemoteServiceError, Result};
use crate::proxy::ProxyPool;

const ERROR_BODY_CHARS: usize = 500;
const DEBUG_BODY_CHARS: usize = 1000;

/// Produces a summary for a piece of text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// HTTP client for the summary service.
#[derive(Debug, Clone)]
pub struct SummaryClient {
    endpoint: String,
    proxies: ProxyPool,
    timeout: Duration,
    debug: bool,
}

impl SummaryClient {
    pub fn new(endpoint: impl Into<String>, proxies: ProxyPool) -> Self {
        Self {
            endpoint: endpoint.into(),
            proxies,
            timeout: Duration::from_secs(SUMMARY_TIMEOUT_SECS),
            debug: false,
        }
    }

    /// Logs the raw service response when enabled.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn dump_response(status: StatusCode, body: &str) {
        info!("Summary service response status: {}", status.as_u16());
        match serde_json::from_str::<Value>(body) {
            Ok(value) => info!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_owned())
            ),
            Err(_) => info!("{}", truncate(body, DEBUG_BODY_CHARS)),
        }
    }
}

#[async_trait]
impl Summarizer for SummaryClient {
    /// Posts `{"text": ...}` to the service.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The service answers 429 (`RemoteServiceError::RateLimited`)
    /// * The service answers any other non-success status
    /// * The response carries no summary
    /// * The request itself fails
    async fn summarize(&self, text: &str) -> Result<String> {
        info!("Requesting summary from the summary service...");

        let client = self
            .proxies
            .apply(reqwest::Client::builder().timeout(self.timeout))?
            .build()
            .map_err(FetchError::Client)?;

        let response = client
            .post(&self.endpoint)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(RemoteServiceError::Request)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(RemoteServiceError::Request)?;

        if self.debug {
            Self::dump_response(status, &body);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteServiceError::RateLimited.into());
        }

        if !status.is_success() {
            return Err(RemoteServiceError::Status {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_CHARS),
            }
            .into());
        }

        let summary = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| value.get("summary")?.as_str().map(str::to_owned))
            .map(|summary| summary.trim().to_owned())
            .unwrap_or_default();

        if summary.is_empty() {
            return Err(Error::RemoteService(RemoteServiceError::EmptySummary));
        }

        Ok(summary)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
