//! Headless Chromium session using chromiumoxide.
//!
//! Every visit launches its own browser with a throwaway profile so that no
//! state is shared between unrelated inputs.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use log::{debug, info, trace, warn};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use crate::AcquiredContent;
use crate::constants::{
    BODY_TEXT_SCRIPT, BROWSER_ACCEPT_LANGUAGE, BROWSER_LAUNCH_ARGS, BROWSER_PLATFORM,
    BROWSER_SHUTDOWN_GRACE_SECS, BROWSER_TIMEZONE, BROWSER_USER_AGENT, BROWSER_VIEWPORT,
    CHALLENGE_BODY_MARKERS,
    CHALLENGE_POLL_SECS, CHALLENGE_TITLE_MARKERS, CHALLENGE_WAIT_SECS, NAVIGATION_TIMEOUT_SECS,
    NETWORK_ACTIVITY_SCRIPT, NETWORK_IDLE_QUIET_MS, STEALTH_SCRIPT,
};
use crate::error::{FetchError, Result};
use crate::fetch::PageRenderer;
use crate::proxy::ProxyPool;

/// Decides whether a rendered page is an anti-bot interstitial.
pub trait ChallengeDetector: Send + Sync {
    fn is_challenge(&self, title: &str, body: &str) -> bool;
}

impl<F> ChallengeDetector for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn is_challenge(&self, title: &str, body: &str) -> bool {
        self(title, body)
    }
}

/// Case-insensitive substring markers for the title and the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerDetector {
    title_markers: Vec<String>,
    body_markers: Vec<String>,
}

impl Default for MarkerDetector {
    fn default() -> Self {
        Self {
            title_markers: CHALLENGE_TITLE_MARKERS.map(str::to_owned).to_vec(),
            body_markers: CHALLENGE_BODY_MARKERS.map(str::to_owned).to_vec(),
        }
    }
}

impl MarkerDetector {
    #[must_use]
    pub fn with_title_marker(mut self, marker: &str) -> Self {
        self.title_markers.push(marker.to_lowercase());
        self
    }

    #[must_use]
    pub fn with_body_marker(mut self, marker: &str) -> Self {
        self.body_markers.push(marker.to_lowercase());
        self
    }
}

impl ChallengeDetector for MarkerDetector {
    fn is_challenge(&self, title: &str, body: &str) -> bool {
        let title = title.to_lowercase();
        let body = body.to_lowercase();

        self.title_markers
            .iter()
            .any(|marker| title.contains(marker.as_str()))
            || self
                .body_markers
                .iter()
                .any(|marker| body.contains(marker.as_str()))
    }
}

/// Renders pages in a stealth-configured headless Chromium.
pub struct BrowserSession {
    proxies: ProxyPool,
    chrome_executable: Option<PathBuf>,
    navigation_timeout: Duration,
    challenge_timeout: Duration,
    challenge_poll: Duration,
    detector: Box<dyn ChallengeDetector>,
}

/// A running browser together with everything that must be released with it.
struct LiveBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    profile: TempDir,
}

impl LiveBrowser {
    async fn shutdown(mut self) {
        terminate(&mut self.browser, Duration::from_secs(BROWSER_SHUTDOWN_GRACE_SECS)).await;
        self.handler.abort();
        if let Err(err) = self.profile.close() {
            debug!("Unable to remove browser profile: {err}");
        }
    }
}

/// Control over the browser child process during shutdown.
#[async_trait]
pub trait BrowserProcess: Send {
    /// Asks the browser to exit on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the close command could not be delivered.
    async fn close(&mut self) -> Result<(), FetchError>;
    /// Forcibly stops the process.
    async fn kill(&mut self);
    /// Waits for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the process status cannot be collected.
    async fn wait(&mut self) -> std::io::Result<()>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn close(&mut self) -> Result<(), FetchError> {
        Browser::close(self).await?;
        Ok(())
    }

    async fn kill(&mut self) {
        if let Some(Err(err)) = Browser::kill(self).await {
            debug!("Unable to kill browser: {err}");
        }
    }

    async fn wait(&mut self) -> std::io::Result<()> {
        Browser::wait(self).await?;
        Ok(())
    }
}

/// Closes the browser and reaps it. A browser that cannot be closed, or that
/// is still running after `grace`, is killed.
pub async fn terminate(process: &mut dyn BrowserProcess, grace: Duration) {
    if let Err(err) = process.close().await {
        debug!("Unable to close browser, killing it: {err}");
        process.kill().await;
    }

    match tokio::time::timeout(grace, process.wait()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!("Unable to reap browser process: {err}"),
        Err(_) => {
            warn!("Browser still running after {}s, killing it", grace.as_secs());
            process.kill().await;
            if let Err(err) = process.wait().await {
                debug!("Unable to reap browser process: {err}");
            }
        }
    }
}

/// Read access to a rendered page.
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// The document title, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be queried.
    async fn title(&self) -> Result<Option<String>, FetchError>;
    /// The visible text of the document body.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be queried.
    async fn body_text(&self) -> Result<String, FetchError>;
}

#[async_trait]
impl RenderedPage for Page {
    async fn title(&self) -> Result<Option<String>, FetchError> {
        Ok(self.get_title().await?)
    }

    async fn body_text(&self) -> Result<String, FetchError> {
        self.evaluate(BODY_TEXT_SCRIPT)
            .await?
            .into_value()
            .map_err(|err| FetchError::BrowserResult(err.to_string()))
    }
}

/// Runs a navigation, reporting it as timed out when it does not finish within
/// `timeout` or when the browser itself gives up waiting.
///
/// # Errors
///
/// Returns `FetchError::NavigationTimeout` on timeout, otherwise the
/// navigation's own error.
pub async fn within_navigation_timeout<F>(
    url: &str,
    timeout: Duration,
    navigation: F,
) -> Result<(), FetchError>
where
    F: Future<Output = Result<(), FetchError>>,
{
    match tokio::time::timeout(timeout, navigation).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(FetchError::Browser(CdpError::Timeout))) | Err(_) => {
            Err(FetchError::NavigationTimeout {
                url: url.to_owned(),
                timeout,
            })
        }
        Ok(Err(err)) => Err(err),
    }
}

impl BrowserSession {
    pub fn new(proxies: ProxyPool) -> Self {
        Self {
            proxies,
            chrome_executable: None,
            navigation_timeout: Duration::from_secs(NAVIGATION_TIMEOUT_SECS),
            challenge_timeout: Duration::from_secs(CHALLENGE_WAIT_SECS),
            challenge_poll: Duration::from_secs(CHALLENGE_POLL_SECS),
            detector: Box::new(MarkerDetector::default()),
        }
    }

    #[must_use]
    pub fn with_chrome_executable(mut self, chrome_executable: Option<PathBuf>) -> Self {
        self.chrome_executable = chrome_executable;
        self
    }

    #[must_use]
    pub fn with_detector(mut self, detector: impl ChallengeDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    #[must_use]
    pub fn with_navigation_timeout(mut self, navigation_timeout: Duration) -> Self {
        self.navigation_timeout = navigation_timeout;
        self
    }

    #[must_use]
    pub fn with_challenge_timeout(mut self, challenge_timeout: Duration) -> Self {
        self.challenge_timeout = challenge_timeout;
        self
    }

    #[must_use]
    pub fn with_challenge_poll(mut self, challenge_poll: Duration) -> Self {
        self.challenge_poll = challenge_poll;
        self
    }

    async fn launch(&self) -> Result<LiveBrowser, FetchError> {
        let profile = tempfile::Builder::new()
            .prefix("gistify-profile-")
            .tempdir()
            .map_err(FetchError::TempFile)?;
        let (width, height) = BROWSER_VIEWPORT;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .window_size(width, height)
            .viewport(Some(Viewport {
                width,
                height,
                ..Default::default()
            }))
            .request_timeout(self.navigation_timeout)
            .args(BROWSER_LAUNCH_ARGS);

        if let Some(chrome_executable) = &self.chrome_executable {
            builder = builder.chrome_executable(chrome_executable);
        }

        if let Some(proxy) = self.proxies.select_endpoint() {
            debug!("Routing browser traffic through {proxy}");
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }

        let config = builder.build().map_err(FetchError::BrowserConfig)?;
        let (browser, mut handler) = Browser::launch(config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    trace!("Browser handler event error: {err}");
                }
            }
        });

        Ok(LiveBrowser {
            browser,
            handler,
            profile,
        })
    }

    async fn visit(
        &self,
        browser: &Browser,
        url: &str,
    ) -> Result<(String, Option<String>), FetchError> {
        let page = browser.new_page("about:blank").await?;
        disguise_page(&page).await?;

        self.navigate(&page, url).await?;
        self.wait_for_challenge(&page).await?;

        let title = page.title().await?;
        let text = page.body_text().await?;
        Ok((text, title))
    }

    async fn navigate(&self, page: &Page, url: &str) -> Result<(), FetchError> {
        within_navigation_timeout(url, self.navigation_timeout, async {
            page.goto(url).await?;
            wait_for_network_idle(page).await
        })
        .await
    }

    /// Polls the page while it looks like a challenge. Gives up after the
    /// challenge budget and lets the caller continue with whatever is shown.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be queried.
    pub async fn wait_for_challenge(&self, page: &dyn RenderedPage) -> Result<(), FetchError> {
        let started = Instant::now();
        let mut announced = false;

        loop {
            let title = page.title().await?.unwrap_or_default();
            let body = page.body_text().await?;
            if !self.detector.is_challenge(&title, &body) {
                return Ok(());
            }

            if started.elapsed() >= self.challenge_timeout {
                warn!(
                    "Challenge page still present after {}s, continuing anyway",
                    self.challenge_timeout.as_secs()
                );
                return Ok(());
            }

            if !announced {
                info!("Challenge page detected, waiting for it to resolve...");
                announced = true;
            }
            tokio::time::sleep(self.challenge_poll).await;
        }
    }
}

#[async_trait]
impl PageRenderer for BrowserSession {
    async fn open(&self, url: &str) -> Result<AcquiredContent> {
        let live = self.launch().await?;
        let visit = self.visit(&live.browser, url).await;
        live.shutdown().await;

        let (text, title) = visit?;
        Ok(AcquiredContent::new(&text, title, url))
    }
}

async fn disguise_page(page: &Page) -> Result<(), FetchError> {
    let user_agent = SetUserAgentOverrideParams::builder()
        .user_agent(BROWSER_USER_AGENT)
        .accept_language(BROWSER_ACCEPT_LANGUAGE)
        .platform(BROWSER_PLATFORM)
        .build()
        .map_err(FetchError::BrowserConfig)?;

    page.execute(user_agent).await?;
    page.execute(SetTimezoneOverrideParams::new(BROWSER_TIMEZONE)).await?;
    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT)).await?;
    Ok(())
}

/// Polls until the document is complete and no new resources were requested
/// during one quiet period.
async fn wait_for_network_idle(page: &Page) -> Result<(), FetchError> {
    let quiet = Duration::from_millis(NETWORK_IDLE_QUIET_MS);
    let mut previous = None;

    loop {
        let resources: i64 = page
            .evaluate(NETWORK_ACTIVITY_SCRIPT)
            .await?
            .into_value()
            .map_err(|err| FetchError::BrowserResult(err.to_string()))?;

        if resources >= 0 && previous == Some(resources) {
            return Ok(());
        }

        previous = Some(resources);
        tokio::time::sleep(quiet).await;
    }
}
