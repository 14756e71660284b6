use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use readlog_core::MetadataResult;
use readlog_logging::{readlog_debug, readlog_warn};
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::decode::{decode_page, essence};
use crate::extract::{HtmlMetadataExtractor, MetadataExtractor};
use crate::{FailureKind, MetadataFetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            user_agent: concat!("Mozilla/5.0 (compatible; readlog/", env!("CARGO_PKG_VERSION"), ")")
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Html,
    Pdf,
    Other,
}

fn classify(content_type: Option<&str>) -> ContentKind {
    match content_type.map(essence).as_deref() {
        None | Some("") | Some("text/html") | Some("application/xhtml+xml") => ContentKind::Html,
        Some("application/pdf") => ContentKind::Pdf,
        Some(_) => ContentKind::Other,
    }
}

#[async_trait::async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<MetadataResult, MetadataFetchError>;

    /// Like [`MetadataFetcher::fetch`] but never fails: any error degrades to
    /// the URL as title with no author or date.
    async fn fetch_safe(&self, url: &str) -> MetadataResult {
        match self.fetch(url).await {
            Ok(metadata) => metadata,
            Err(err) => {
                readlog_warn!("Metadata fetch for {} failed: {}", url, err);
                MetadataResult::placeholder(url)
            }
        }
    }
}

#[derive(Clone)]
pub struct HttpMetadataFetcher {
    settings: FetchSettings,
    extractor: Arc<dyn MetadataExtractor>,
}

impl HttpMetadataFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self {
            settings,
            extractor: Arc::new(HtmlMetadataExtractor),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    fn build_client(&self) -> Result<reqwest::Client, MetadataFetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.settings.redirect_limit))
            .user_agent(self.settings.user_agent.clone())
            .build()
            .map_err(|err| MetadataFetchError::new(FailureKind::Network, err.to_string()))
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, MetadataFetchError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, url: &str) -> Result<MetadataResult, MetadataFetchError> {
        let parsed = Url::parse(url)
            .map_err(|err| MetadataFetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;

        let response = client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataFetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        match classify(content_type.as_deref()) {
            ContentKind::Pdf => Ok(MetadataResult {
                title: Some(pdf_title(&final_url)),
                author: None,
                published_date: None,
            }),
            ContentKind::Other => Ok(MetadataResult::placeholder(url)),
            ContentKind::Html => {
                let bytes = self.read_body(response).await?;
                let page = decode_page(&bytes, content_type.as_deref());
                readlog_debug!(
                    "Fetched {} ({} bytes, {})",
                    final_url,
                    bytes.len(),
                    page.encoding_label
                );
                Ok(self.extractor.extract(&page.html, final_url.as_str()))
            }
        }
    }
}

/// Last non-empty path segment without a `.pdf` suffix, or the whole URL.
fn pdf_title(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(|segment| {
            let lower = segment.to_ascii_lowercase();
            match lower.strip_suffix(".pdf") {
                Some(stem) => segment[..stem.len()].to_string(),
                None => segment.to_string(),
            }
        })
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| url.to_string())
}

fn too_large(max_bytes: u64, actual: Option<u64>) -> MetadataFetchError {
    MetadataFetchError::new(
        FailureKind::TooLarge { max_bytes, actual },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> MetadataFetchError {
    if err.is_timeout() {
        return MetadataFetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return MetadataFetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    MetadataFetchError::new(FailureKind::Network, err.to_string())
}
