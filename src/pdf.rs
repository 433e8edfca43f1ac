//! The pdf module reads PDF documents from disk or from the network and
//! extracts their text.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use url::Url;

use crate::AcquiredContent;
use crate::constants::{DOWNLOAD_TIMEOUT_SECS, DOWNLOAD_USER_AGENT, MAX_DOCUMENT_BYTES};
use crate::error::{Error, FetchError, Result};
use crate::fetch::DocumentExtractor;
use crate::proxy::ProxyPool;

/// Extracts text from PDF files and PDF downloads.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    proxies: ProxyPool,
    max_bytes: u64,
    download_timeout: Duration,
    download_dir: Option<PathBuf>,
}

impl PdfExtractor {
    pub fn new(proxies: ProxyPool) -> Self {
        Self {
            proxies,
            max_bytes: MAX_DOCUMENT_BYTES,
            download_timeout: Duration::from_secs(DOWNLOAD_TIMEOUT_SECS),
            download_dir: None,
        }
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use]
    pub fn with_download_timeout(mut self, download_timeout: Duration) -> Self {
        self.download_timeout = download_timeout;
        self
    }

    /// Buffers downloads in `download_dir` instead of the system temp dir.
    #[must_use]
    pub fn with_download_dir(mut self, download_dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(download_dir.into());
        self
    }

    /// Extracts the trimmed text of a PDF file.
    ///
    /// The file size is checked from its metadata before any content is read.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file does not exist (`Error::InputNotFound`)
    /// * The file is larger than the size limit (`Error::InputTooLarge`)
    /// * The PDF engine cannot extract text from the file
    pub async fn extract_file(&self, path: &Path) -> Result<String> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::InputNotFound(path.to_path_buf()));
            }
            Err(err) => {
                return Err(Error::Extraction {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                });
            }
        };

        if metadata.len() > self.max_bytes {
            return Err(Error::InputTooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit: self.max_bytes,
            });
        }

        let owned_path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned_path))
            .await
            .map_err(|err| Error::Extraction {
                path: path.to_path_buf(),
                reason: format!("PDF engine aborted: {err}"),
            })?
            .map_err(|err| Error::Extraction {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        Ok(text.trim().to_owned())
    }

    /// Downloads a PDF and extracts its text.
    ///
    /// The body is buffered in a temporary file that is removed once
    /// extraction finishes, whether or not it succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The request fails or the server answers with a non-success status
    /// * The temporary file cannot be written
    /// * Text extraction fails
    pub async fn download_text(&self, url: &str) -> Result<String> {
        info!("Downloading PDF: {url}");

        let client = self
            .proxies
            .apply(
                reqwest::Client::builder()
                    .user_agent(DOWNLOAD_USER_AGENT)
                    .timeout(self.download_timeout),
            )?
            .build()
            .map_err(FetchError::Client)?;

        let request_error = |source| FetchError::Request {
            url: url.to_owned(),
            source,
        };

        let response = client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(request_error)?;
        debug!("Downloaded {} bytes from {url}", body.len());

        let mut builder = tempfile::Builder::new();
        builder.prefix("gistify-").suffix(".pdf");
        let mut file = self
            .download_dir
            .as_ref()
            .map_or_else(|| builder.tempfile(), |dir| builder.tempfile_in(dir))
            .map_err(FetchError::TempFile)?;
        file.write_all(&body).map_err(FetchError::TempFile)?;
        file.flush().map_err(FetchError::TempFile)?;

        let text = self.extract_file(file.path()).await;
        if let Err(err) = file.close() {
            debug!("Unable to remove temporary PDF: {err}");
        }
        text
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract_path(&self, path: &Path) -> Result<AcquiredContent> {
        let path = tokio::fs::canonicalize(path)
            .await
            .or_else(|_| std::path::absolute(path))
            .unwrap_or_else(|_| path.to_path_buf());
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Extracting text from PDF: {file_name}");

        let text = self.extract_file(&path).await?;
        Ok(AcquiredContent::new(&text, None, file_url(&path)))
    }

    async fn extract_url(&self, url: &str) -> Result<AcquiredContent> {
        let text = self.download_text(url).await?;
        Ok(AcquiredContent::new(&text, None, url))
    }
}

/// `file://` URL for a local path, falling back to the plain path when it
/// cannot be expressed as one.
fn file_url(path: &Path) -> String {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|()| format!("file://{}", path.display()))
}
