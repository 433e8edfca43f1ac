//! gistify is a CLI tool that summarizes a web article or a PDF and saves the
//! summary as a Markdown document.
//!
//! The input is either a URL or a path to a local PDF. arXiv abstract pages are
//! fetched as PDFs; other pages are rendered in a headless browser.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, info};

use gistify::{
    AcquisitionPipeline, DocumentFetcher, ProxyOverride, ProxyPool, RateLimiter, SummaryClient,
    browser::BrowserSession,
    compose::{output_path, to_markdown, write_markdown},
    config::Settings,
    constants::{DEFAULT_MAX_REQUESTS_PER_WINDOW, DEFAULT_MIN_INTERVAL_SECS},
    pdf::PdfExtractor,
};

/// Summarize articles and PDFs into Markdown
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// URL of the article or path to a local PDF
    input: String,

    /// Output file path (default: generated from the title)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Dump the raw summary service response
    #[arg(long)]
    debug: bool,

    /// Force proxy usage (overrides the proxy configuration file)
    #[arg(long, conflicts_with = "no_proxy")]
    proxy: bool,

    /// Disable proxy usage (overrides the proxy configuration file)
    #[arg(long)]
    no_proxy: bool,

    /// Maximum number of summary requests per hour
    #[arg(long, default_value_t = DEFAULT_MAX_REQUESTS_PER_WINDOW)]
    max_per_hour: usize,

    /// Minimum delay between summary requests in seconds
    #[arg(long, default_value_t = DEFAULT_MIN_INTERVAL_SECS)]
    min_interval: f64,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", default_value_t = 2)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    let settings = Settings::from_env();
    let proxies = ProxyPool::new(
        &settings.proxy_config_path,
        ProxyOverride::from_flags(cli.proxy, cli.no_proxy),
    );

    let limiter = RateLimiter::new(&settings.history_path)
        .with_max_requests(cli.max_per_hour)
        .with_min_interval(Duration::try_from_secs_f64(cli.min_interval).unwrap_or_default());
    let browser = BrowserSession::new(proxies.clone())
        .with_chrome_executable(settings.chrome_executable.clone());
    let extractor = PdfExtractor::new(proxies.clone());
    let summarizer = SummaryClient::new(&settings.api_url, proxies).with_debug(cli.debug);

    let pipeline = AcquisitionPipeline::new(&limiter, DocumentFetcher::new(&browser, &extractor));
    let gist = pipeline.run(&cli.input, &summarizer).await?;

    let title = gist.content.title.as_deref();
    let markdown = to_markdown(
        &gist.summary,
        &gist.content.source_url,
        title,
        chrono::Local::now().date_naive(),
    );

    let path = output_path(cli.output.as_deref(), &settings.output_dir, title);
    write_markdown(&path, &markdown)?;
    info!("Summary saved to: {}", path.display());

    Ok(())
}
