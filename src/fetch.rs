//! The fetch module decides how an input is acquired: local files and known
//! academic landing pages go through PDF extraction, everything else is
//! rendered in a browser.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::constants::{ARXIV_ABS_PATTERN, ARXIV_HTML_PATTERN, ARXIV_PDF_TEMPLATE};
use crate::error::{Error, FetchError, Result};
use crate::{AcquiredContent, InputTarget};

const URL_SCHEMES: [&str; 2] = ["http://", "https://"];

static DEFAULT_REWRITES: Lazy<UrlRewriter> = Lazy::new(|| {
    UrlRewriter::new(vec![
        RewriteRule::new(ARXIV_ABS_PATTERN, ARXIV_PDF_TEMPLATE)
            .expect("Failed to compile arXiv abstract pattern"),
        RewriteRule::new(ARXIV_HTML_PATTERN, ARXIV_PDF_TEMPLATE)
            .expect("Failed to compile arXiv HTML pattern"),
    ])
});

/// Renders a web page and extracts its visible text.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Visits `url` and returns its text and title.
    async fn open(&self, url: &str) -> Result<AcquiredContent>;
}

/// Extracts text from document files.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extracts text from a file on disk.
    async fn extract_path(&self, path: &Path) -> Result<AcquiredContent>;
    /// Downloads a document and extracts its text.
    async fn extract_url(&self, url: &str) -> Result<AcquiredContent>;
}

/// Maps a landing page URL to the URL of its document.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    matcher: Regex,
    replacement: String,
}

impl RewriteRule {
    /// Builds a rule from a pattern anchored on the whole URL and a replacement
    /// template referring to its capture groups (`$name`).
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regular expression.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            matcher: Regex::new(pattern)?,
            replacement: replacement.to_owned(),
        })
    }

    /// Returns the rewritten URL when the rule matches.
    #[must_use]
    pub fn apply(&self, url: &str) -> Option<String> {
        let captures = self.matcher.captures(url)?;
        let mut rewritten = String::new();
        captures.expand(&self.replacement, &mut rewritten);
        Some(rewritten)
    }
}

/// Ordered rewrite table; the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct UrlRewriter {
    rules: Vec<RewriteRule>,
}

impl UrlRewriter {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// The built-in academic landing page rules.
    #[must_use]
    pub fn academic() -> Self {
        DEFAULT_REWRITES.clone()
    }

    #[must_use]
    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn rewrite(&self, url: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.apply(url))
    }
}

/// Detects academic landing pages and returns the direct document URL.
#[must_use]
pub fn rewrite_document_url(url: &str) -> Option<String> {
    DEFAULT_REWRITES.rewrite(url)
}

/// Classifies the raw input. Scheme-prefixed inputs are never looked up on disk.
#[must_use]
pub fn classify_input(input: &str) -> InputTarget {
    if has_url_scheme(input) {
        return InputTarget::RemoteUrl(input.to_owned());
    }

    let path = expand_home(input);
    if path.exists() {
        InputTarget::LocalFile(path)
    } else {
        InputTarget::RemoteUrl(input.to_owned())
    }
}

fn has_url_scheme(input: &str) -> bool {
    let lowered = input.trim_start().to_ascii_lowercase();
    URL_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme))
}

fn expand_home(input: &str) -> PathBuf {
    match (input.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if input == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(input)),
        _ => PathBuf::from(input),
    }
}

/// Dispatches an input to the matching extraction strategy.
pub struct DocumentFetcher<'a> {
    /// Browser used for ordinary web pages
    pub renderer: &'a dyn PageRenderer,
    /// Extractor used for local files and document downloads
    pub extractor: &'a dyn DocumentExtractor,
    /// Landing page rewrite table
    pub rewriter: UrlRewriter,
}

impl<'a> DocumentFetcher<'a> {
    pub fn new(renderer: &'a dyn PageRenderer, extractor: &'a dyn DocumentExtractor) -> Self {
        Self {
            renderer,
            extractor,
            rewriter: UrlRewriter::academic(),
        }
    }

    #[must_use]
    pub fn with_rewriter(mut self, rewriter: UrlRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// Acquires the text of a classified input.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * A remote input without a scheme is not an absolute URL (`Error::InputNotFound`)
    /// * A scheme-prefixed input is not a valid URL
    /// * The selected strategy fails
    pub async fn acquire(&self, target: &InputTarget) -> Result<AcquiredContent> {
        match target {
            InputTarget::LocalFile(path) => self.extractor.extract_path(path).await,
            InputTarget::RemoteUrl(url) => {
                if let Err(source) = Url::parse(url) {
                    return Err(if has_url_scheme(url) {
                        FetchError::InvalidUrl {
                            url: url.clone(),
                            source,
                        }
                        .into()
                    } else {
                        Error::InputNotFound(PathBuf::from(url))
                    });
                }

                match self.rewriter.rewrite(url) {
                    Some(document_url) => {
                        debug!("Rewrote {url} to {document_url}");
                        self.extractor.extract_url(&document_url).await
                    }
                    None => {
                        info!("Extracting content from URL: {url}");
                        self.renderer.open(url).await
                    }
                }
            }
        }
    }
}
