use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{BlobSnapshot, DocumentLocator, VersionToken};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BlobError {
    /// The supplied version no longer matches the stored one.
    #[error("version conflict: {message}")]
    Conflict { message: String },
    #[error("blob read failed with status {status}: {message}")]
    Read { status: u16, message: String },
    #[error("blob write failed with status {status}: {message}")]
    Write { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid blob api response: {0}")]
    InvalidResponse(String),
}

impl BlobError {
    /// Upstream status when the provider answered, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BlobError::Conflict { .. } => Some(StatusCode::CONFLICT.as_u16()),
            BlobError::Read { status, .. } | BlobError::Write { status, .. } => Some(*status),
            BlobError::Transport(_) | BlobError::InvalidResponse(_) => None,
        }
    }
}

/// Versioned blob storage. Each call is exactly one round trip; retrying is
/// the caller's business.
#[async_trait::async_trait]
pub trait BlobClient: Send + Sync {
    async fn get_blob(&self, locator: &DocumentLocator) -> Result<BlobSnapshot, BlobError>;

    async fn put_blob(
        &self,
        locator: &DocumentLocator,
        content: &[u8],
        message: &str,
        version: Option<&VersionToken>,
    ) -> Result<VersionToken, BlobError>;
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub api_base: String,
    pub token: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token: String::new(),
            user_agent: concat!("readlog/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// [`BlobClient`] over the GitHub repository contents API.
#[derive(Debug, Clone)]
pub struct GitHubBlobClient {
    settings: GitHubSettings,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: ContentsResponse,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: Option<String>,
}

impl GitHubBlobClient {
    pub fn new(settings: GitHubSettings) -> Result<Self, BlobError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| BlobError::Transport(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn contents_url(&self, locator: &DocumentLocator) -> Result<Url, BlobError> {
        let mut url = Url::parse(&self.settings.api_base)
            .map_err(|err| BlobError::InvalidResponse(format!("bad api base: {err}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BlobError::InvalidResponse("api base cannot be a base".into()))?;
            segments
                .pop_if_empty()
                .extend(["repos", locator.owner.as_str(), locator.repo.as_str(), "contents"])
                .extend(locator.path.split('/').filter(|part| !part.is_empty()));
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url).header(ACCEPT, GITHUB_ACCEPT);
        if self.settings.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.settings.token)
        }
    }
}

#[async_trait::async_trait]
impl BlobClient for GitHubBlobClient {
    async fn get_blob(&self, locator: &DocumentLocator) -> Result<BlobSnapshot, BlobError> {
        let mut url = self.contents_url(locator)?;
        url.query_pairs_mut().append_pair("ref", &locator.branch);

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|err| BlobError::Transport(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(BlobSnapshot::absent());
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| BlobError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(BlobError::Read {
                status: status.as_u16(),
                message: api_message(status, &body),
            });
        }

        let contents: ContentsResponse = serde_json::from_slice(&body)
            .map_err(|err| BlobError::InvalidResponse(err.to_string()))?;
        let content = decode_content(&contents)?;
        Ok(BlobSnapshot {
            content: Some(content),
            version: Some(VersionToken::new(contents.sha)),
        })
    }

    async fn put_blob(
        &self,
        locator: &DocumentLocator,
        content: &[u8],
        message: &str,
        version: Option<&VersionToken>,
    ) -> Result<VersionToken, BlobError> {
        let url = self.contents_url(locator)?;
        let payload = PutRequest {
            message,
            content: STANDARD.encode(content),
            branch: &locator.branch,
            sha: version.map(VersionToken::as_str),
        };
        let body =
            serde_json::to_vec(&payload).map_err(|err| BlobError::InvalidResponse(err.to_string()))?;

        let response = self
            .request(reqwest::Method::PUT, url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| BlobError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| BlobError::Transport(err.to_string()))?;

        if status.is_success() {
            let created: PutResponse = serde_json::from_slice(&body)
                .map_err(|err| BlobError::InvalidResponse(err.to_string()))?;
            return Ok(VersionToken::new(created.content.sha));
        }

        let message = api_message(status, &body);
        let conflicted = status == StatusCode::CONFLICT
            || (status == StatusCode::UNPROCESSABLE_ENTITY
                && version.is_none()
                && is_racing_create(&message));
        if conflicted {
            Err(BlobError::Conflict { message })
        } else {
            Err(BlobError::Write {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn decode_content(contents: &ContentsResponse) -> Result<Vec<u8>, BlobError> {
    match contents.encoding.as_deref() {
        None | Some("base64") => {}
        Some(other) => {
            return Err(BlobError::InvalidResponse(format!(
                "unsupported content encoding {other:?}"
            )))
        }
    }
    // The API wraps base64 at 60 columns.
    let packed: String = contents
        .content
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(packed)
        .map_err(|err| BlobError::InvalidResponse(format!("bad base64 content: {err}")))
}

/// A create rejected for a missing `sha` means the file appeared after it was
/// read as absent.
fn is_racing_create(message: &str) -> bool {
    message.contains("sha")
}

fn api_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ApiMessage>(body)
        .ok()
        .and_then(|m| m.message)
        .unwrap_or_else(|| status.to_string())
}
