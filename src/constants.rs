pub const API_URL_ENV_NAME: &str = "GISTIFY_API_URL";
pub const RATE_LIMIT_FILE_ENV_NAME: &str = "GISTIFY_RATE_LIMIT_FILE";
pub const PROXY_CONFIG_ENV_NAME: &str = "GISTIFY_PROXY_CONFIG";
pub const CHROME_PATH_ENV_NAME: &str = "GISTIFY_CHROME_PATH";
pub const OUTPUT_DIR_ENV_NAME: &str = "GISTIFY_OUTPUT_DIR";

pub const DEFAULT_API_URL: &str =
    "https://tourmaline-gaufre-130bc5.netlify.app/.netlify/functions/summarize";
pub const DEFAULT_PROXY_CONFIG_FILE: &str = ".scholar-proxies.json";
pub const DEFAULT_RATE_LIMIT_FILE: &str = "rate_limit_log.json";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const APP_DIR_NAME: &str = "gistify";

pub const RATE_LIMIT_WINDOW_SECS: f64 = 3600.0;
pub const DEFAULT_MAX_REQUESTS_PER_WINDOW: usize = 10;
pub const DEFAULT_MIN_INTERVAL_SECS: f64 = 5.0;

pub const MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;
pub const LOW_CONTENT_CHARS: usize = 50;

pub const NAVIGATION_TIMEOUT_SECS: u64 = 60;
pub const CHALLENGE_WAIT_SECS: u64 = 30;
pub const CHALLENGE_POLL_SECS: u64 = 2;
pub const NETWORK_IDLE_QUIET_MS: u64 = 500;
pub const BROWSER_SHUTDOWN_GRACE_SECS: u64 = 5;
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 60;
pub const SUMMARY_TIMEOUT_SECS: u64 = 120;

pub const DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0";
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
pub const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en";
pub const BROWSER_PLATFORM: &str = "MacIntel";
pub const BROWSER_TIMEZONE: &str = "America/New_York";
pub const BROWSER_VIEWPORT: (u32, u32) = (1280, 720);

pub const BROWSER_LAUNCH_ARGS: [&str; 5] = [
    "--disable-blink-features=AutomationControlled",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-extensions",
    "--lang=en-US",
];

/// Injected before any page script runs. The resource timing buffer is
/// raised so that network idle detection keeps seeing new requests on heavy
/// pages.
pub const STEALTH_SCRIPT: &str = r#"
    if (performance.setResourceTimingBufferSize) {
        performance.setResourceTimingBufferSize(100000);
    }
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    window.chrome = { runtime: {} };
"#;

pub(crate) const BODY_TEXT_SCRIPT: &str = "document.body ? document.body.innerText : ''";

/// Resource count once the document is complete, `-1` while it is still loading.
pub(crate) const NETWORK_ACTIVITY_SCRIPT: &str = "document.readyState === 'complete' \
     ? performance.getEntriesByType('resource').length : -1";

pub(crate) const CHALLENGE_TITLE_MARKERS: [&str; 1] = ["just a moment"];
pub(crate) const CHALLENGE_BODY_MARKERS: [&str; 1] = ["checking your browser"];

pub(crate) const ARXIV_ABS_PATTERN: &str = r"^https?://arxiv\.org/abs/(?P<id>.+?)(?:\?.*)?$";
pub(crate) const ARXIV_HTML_PATTERN: &str = r"^https?://arxiv\.org/html/(?P<id>.+?)(?:\?.*)?$";
pub(crate) const ARXIV_PDF_TEMPLATE: &str = "https://arxiv.org/pdf/$id";
