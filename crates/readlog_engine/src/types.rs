use std::fmt;
use std::sync::Arc;

/// Produces today's date as `YYYY-MM-DD`; injected so tests can pin it.
pub type DateSource = Arc<dyn Fn() -> String + Send + Sync>;

pub fn local_today() -> DateSource {
    Arc::new(|| chrono::Local::now().format("%Y-%m-%d").to_string())
}

pub fn fixed_today(date: impl Into<String>) -> DateSource {
    let date = date.into();
    Arc::new(move || date.clone())
}

/// Identifies one remote document: `(owner, repo, path, branch)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentLocator {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: String,
}

impl DocumentLocator {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        path: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            path: path.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for DocumentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}@{}", self.owner, self.repo, self.path, self.branch)
    }
}

/// Opaque content revision identifier issued by the blob API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a blob read. Both fields are `None` when the path does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlobSnapshot {
    pub content: Option<Vec<u8>>,
    pub version: Option<VersionToken>,
}

impl BlobSnapshot {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_absent(&self) -> bool {
        self.content.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl MetadataFetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for MetadataFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for MetadataFetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
