//! The rate_limit module keeps a rolling log of summary requests on disk and
//! enforces a per-hour quota and a minimum spacing between requests.
//!
//! The log is a JSON array of UNIX timestamps. Reads and writes are not
//! atomic: two processes sharing the same file may race, and the last writer
//! wins.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::constants::{
    DEFAULT_MAX_REQUESTS_PER_WINDOW, DEFAULT_MIN_INTERVAL_SECS, RATE_LIMIT_WINDOW_SECS,
};
use crate::error::{Error, Result};

/// Outcome of inspecting the request history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateDecision {
    /// The request may go ahead immediately.
    Proceed,
    /// The request may go ahead after sleeping for the given duration.
    Wait(Duration),
    /// The hourly quota is used up.
    Exceeded { retry_after: Duration },
}

/// File-backed request limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    history_path: PathBuf,
    max_requests: usize,
    min_interval: Duration,
    window: Duration,
}

impl RateLimiter {
    pub fn new(history_path: impl Into<PathBuf>) -> Self {
        Self {
            history_path: history_path.into(),
            max_requests: DEFAULT_MAX_REQUESTS_PER_WINDOW,
            min_interval: Duration::from_secs_f64(DEFAULT_MIN_INTERVAL_SECS),
            window: Duration::from_secs_f64(RATE_LIMIT_WINDOW_SECS),
        }
    }

    #[must_use]
    pub fn with_max_requests(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests.max(1);
        self
    }

    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    #[must_use]
    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    #[must_use]
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Reads the persisted history. A missing or corrupt file reads as empty.
    #[must_use]
    pub fn load_history(&self) -> Vec<f64> {
        let content = match std::fs::read_to_string(&self.history_path) {
            Ok(content) => content,
            Err(err) => {
                debug!(
                    "No rate limit history at {}: {err}",
                    self.history_path.display()
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<f64>>(&content) {
            Ok(history) => history.into_iter().filter(|ts| ts.is_finite()).collect(),
            Err(err) => {
                debug!(
                    "Ignoring corrupt rate limit history {}: {err}",
                    self.history_path.display()
                );
                Vec::new()
            }
        }
    }

    /// Decides whether a request at `now` may proceed.
    ///
    /// The quota is checked before the spacing: a full quota is a hard stop
    /// even when the last request was recent.
    #[must_use]
    pub fn decide(&self, history: &[f64], now: f64) -> RateDecision {
        let window_secs = self.window.as_secs_f64();
        let in_window = prune(history, now, window_secs);

        if in_window.len() >= self.max_requests {
            let oldest = in_window.iter().copied().fold(now, f64::min);
            let retry_after = (window_secs - (now - oldest)).max(0.0);
            return RateDecision::Exceeded {
                retry_after: Duration::from_secs_f64(retry_after),
            };
        }

        let Some(latest) = in_window.iter().copied().reduce(f64::max) else {
            return RateDecision::Proceed;
        };

        let elapsed = (now - latest).max(0.0);
        let min_interval = self.min_interval.as_secs_f64();
        if elapsed < min_interval {
            RateDecision::Wait(Duration::from_secs_f64(min_interval - elapsed))
        } else {
            RateDecision::Proceed
        }
    }

    /// Fails when the quota is used up, otherwise sleeps for whatever remains of
    /// the minimum spacing.
    ///
    /// # Errors
    ///
    /// Returns `Error::RateLimitExceeded` when the hourly quota is reached.
    pub async fn check_and_wait(&self) -> Result<()> {
        match self.decide(&self.load_history(), unix_now()) {
            RateDecision::Proceed => Ok(()),
            RateDecision::Wait(wait) => {
                info!(
                    "Rate limit: waiting {:.1}s between requests...",
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                Ok(())
            }
            RateDecision::Exceeded { retry_after } => Err(Error::RateLimitExceeded {
                quota: self.max_requests,
                retry_after,
            }),
        }
    }

    /// Appends the current time to the history.
    ///
    /// # Errors
    ///
    /// Returns `Error::History` if the history file cannot be written.
    pub fn record(&self) -> Result<()> {
        self.record_at(unix_now())
    }

    /// Appends `now` to the history, dropping entries that left the window.
    ///
    /// # Errors
    ///
    /// Returns `Error::History` if the history file cannot be written.
    pub fn record_at(&self, now: f64) -> Result<()> {
        let mut history = prune(&self.load_history(), now, self.window.as_secs_f64());
        history.push(now);

        let history_error = |source| Error::History {
            path: self.history_path.clone(),
            source,
        };

        if let Some(parent) = self.history_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(history_error)?;
        }

        let content = serde_json::to_string(&history).map_err(|err| history_error(err.into()))?;
        std::fs::write(&self.history_path, content).map_err(history_error)?;

        debug!(
            "Recorded request, {} in the current window",
            history.len()
        );
        Ok(())
    }
}

/// Keeps the timestamps that are at most `window_secs` old relative to `now`,
/// preserving their order.
#[must_use]
pub fn prune(history: &[f64], now: f64, window_secs: f64) -> Vec<f64> {
    history
        .iter()
        .copied()
        .filter(|ts| now - ts <= window_secs)
        .collect()
}

/// Seconds since the UNIX epoch.
#[must_use]
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}
