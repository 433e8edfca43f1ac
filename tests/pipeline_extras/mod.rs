#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gistify::error::{RemoteServiceError, Result};
use gistify::fetch::{DocumentExtractor, PageRenderer};
use gistify::{AcquiredContent, RateLimiter, Summarizer};
use tempfile::TempDir;

pub const ARTICLE_TEXT: &str = "This article is long enough to be considered real content by the extractor.";

/// Renderer that records visited URLs instead of launching a browser.
pub(crate) struct StubRenderer {
    text: String,
    title: Option<String>,
    pub visits: Mutex<Vec<String>>,
}

impl StubRenderer {
    pub fn new(text: &str, title: Option<&str>) -> Self {
        StubRenderer {
            text: text.to_owned(),
            title: title.map(str::to_owned),
            visits: Mutex::new(Vec::new()),
        }
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().expect("visits mutex poisoned").clone()
    }
}

#[async_trait]
impl PageRenderer for StubRenderer {
    async fn open(&self, url: &str) -> Result<AcquiredContent> {
        self.visits
            .lock()
            .expect("visits mutex poisoned")
            .push(url.to_owned());
        Ok(AcquiredContent::new(&self.text, self.title.clone(), url))
    }
}

/// Extractor that records requested paths and URLs.
pub(crate) struct StubExtractor {
    text: String,
    pub paths: Mutex<Vec<PathBuf>>,
    pub urls: Mutex<Vec<String>>,
}

impl StubExtractor {
    pub fn new(text: &str) -> Self {
        StubExtractor {
            text: text.to_owned(),
            paths: Mutex::new(Vec::new()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().expect("paths mutex poisoned").clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("urls mutex poisoned").clone()
    }
}

#[async_trait]
impl DocumentExtractor for StubExtractor {
    async fn extract_path(&self, path: &Path) -> Result<AcquiredContent> {
        self.paths
            .lock()
            .expect("paths mutex poisoned")
            .push(path.to_path_buf());
        Ok(AcquiredContent::new(
            &self.text,
            None,
            format!("file://{}", path.display()),
        ))
    }

    async fn extract_url(&self, url: &str) -> Result<AcquiredContent> {
        self.urls
            .lock()
            .expect("urls mutex poisoned")
            .push(url.to_owned());
        Ok(AcquiredContent::new(&self.text, None, url))
    }
}

pub(crate) enum StubOutcome {
    Summary(&'static str),
    RateLimited,
}

/// Summarizer answering with a fixed outcome.
pub(crate) struct StubSummarizer {
    outcome: StubOutcome,
}

impl StubSummarizer {
    pub fn new(outcome: StubOutcome) -> Self {
        StubSummarizer { outcome }
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, _text: &str) -> Result<String> {
        match self.outcome {
            StubOutcome::Summary(summary) => Ok(summary.to_owned()),
            StubOutcome::RateLimited => Err(RemoteServiceError::RateLimited.into()),
        }
    }
}

/// Limiter backed by a history file inside `dir`, without spacing delays.
pub fn quick_limiter(dir: &TempDir) -> RateLimiter {
    RateLimiter::new(dir.path().join("history.json")).with_min_interval(Duration::ZERO)
}
