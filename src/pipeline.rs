//! The pipeline module ties rate limiting, acquisition and summarization
//! together for a single input.

use log::debug;

use crate::AcquiredContent;
use crate::error::Result;
use crate::fetch::{DocumentFetcher, classify_input};
use crate::rate_limit::RateLimiter;
use crate::summarize::Summarizer;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gist {
    /// The content that was summarized
    pub content: AcquiredContent,
    /// The summary returned by the service
    pub summary: String,
}

/// Coordinates one acquisition under the rate limiter.
pub struct AcquisitionPipeline<'a> {
    /// Request history guard
    pub limiter: &'a RateLimiter,
    /// Strategy dispatcher
    pub fetcher: DocumentFetcher<'a>,
}

impl<'a> AcquisitionPipeline<'a> {
    pub fn new(limiter: &'a RateLimiter, fetcher: DocumentFetcher<'a>) -> Self {
        Self { limiter, fetcher }
    }

    /// Checks the rate limit, then classifies and acquires the input.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The hourly quota is used up
    /// * The input cannot be acquired
    pub async fn acquire(&self, input: &str) -> Result<AcquiredContent> {
        self.limiter.check_and_wait().await?;

        let target = classify_input(input);
        debug!("Classified {input} as {target:?}");
        self.fetcher.acquire(&target).await
    }

    /// Acquires the input, summarizes it and records the request once both
    /// steps succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The hourly quota is used up
    /// * The input cannot be acquired
    /// * The summary service fails
    /// * The request history cannot be written
    pub async fn run(&self, input: &str, summarizer: &dyn Summarizer) -> Result<Gist> {
        let content = self.acquire(input).await?;
        let summary = summarizer.summarize(&content.text).await?;
        self.limiter.record()?;

        Ok(Gist { content, summary })
    }
}
