use std::sync::Arc;
use std::time::Duration;

use readlog_core::{apply, Change, DocumentError, DocumentShape, Entry, Mutation, ReadingDocument};
use readlog_logging::{readlog_debug, readlog_info, readlog_warn};

use crate::blob::{BlobClient, BlobError};
use crate::types::{local_today, DateSource};
use crate::{DocumentLocator, VersionToken};

/// How many fetch→commit attempts one operation may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause before refetching after a conflict.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::ZERO,
        }
    }
}

#[derive(Clone)]
pub struct StoreSettings {
    pub retry: RetryPolicy,
    /// Shape written when the document does not exist yet.
    pub new_document_shape: DocumentShape,
    pub today: DateSource,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            new_document_shape: DocumentShape::WrappedEntries,
            today: local_today(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Upsert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    AttemptStarted {
        operation: StoreOperation,
        attempt: u32,
    },
    Conflict {
        operation: StoreOperation,
        attempt: u32,
        will_retry: bool,
    },
    Committed {
        operation: StoreOperation,
        attempt: u32,
        version: VersionToken,
    },
    Skipped {
        operation: StoreOperation,
        attempt: u32,
        status: OutcomeStatus,
    },
}

pub trait StoreObserver: Send + Sync {
    fn emit(&self, event: StoreEvent);
}

/// Default observer: forwards every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl StoreObserver for LoggingObserver {
    fn emit(&self, event: StoreEvent) {
        match event {
            StoreEvent::AttemptStarted { operation, attempt } => {
                readlog_debug!("{:?} attempt {} started", operation, attempt);
            }
            StoreEvent::Conflict {
                operation,
                attempt,
                will_retry,
            } => {
                readlog_warn!(
                    "{:?} attempt {} hit a version conflict (retry: {})",
                    operation,
                    attempt,
                    will_retry
                );
            }
            StoreEvent::Committed {
                operation,
                attempt,
                version,
            } => {
                readlog_info!(
                    "{:?} committed on attempt {} as version {}",
                    operation,
                    attempt,
                    version
                );
            }
            StoreEvent::Skipped {
                operation,
                attempt,
                status,
            } => {
                readlog_info!(
                    "{:?} attempt {} made no change ({})",
                    operation,
                    attempt,
                    status.as_str()
                );
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Committed,
    DuplicateNoop,
    NotFoundNoop,
    AbsentNoop,
    UnknownFormatNoop,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Committed => "committed",
            OutcomeStatus::DuplicateNoop => "duplicate-noop",
            OutcomeStatus::NotFoundNoop => "not-found-noop",
            OutcomeStatus::AbsentNoop => "absent-noop",
            OutcomeStatus::UnknownFormatNoop => "unknown-format-noop",
        }
    }

    fn from_change(change: Change) -> Self {
        match change {
            Change::Inserted | Change::Removed(_) => OutcomeStatus::Committed,
            Change::Duplicate => OutcomeStatus::DuplicateNoop,
            Change::Absent => OutcomeStatus::AbsentNoop,
            Change::UnknownFormat => OutcomeStatus::UnknownFormatNoop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOutcome {
    pub status: OutcomeStatus,
    /// New version after a commit, or the version the no-op was decided on.
    pub version: Option<VersionToken>,
    pub attempts: u32,
    pub removed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document {locator} still conflicted after {attempts} attempts")]
    ConflictExceeded { locator: String, attempts: u32 },
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("failed to encode document: {0}")]
    Encode(String),
}

impl From<DocumentError> for StoreError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Malformed(message) => StoreError::MalformedDocument(message),
            DocumentError::Encode(message) => StoreError::Encode(message),
        }
    }
}

impl StoreError {
    /// Caller-visible status: 409 for exhausted retries, the upstream status
    /// when the provider answered, otherwise a server error.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::ConflictExceeded { .. } => 409,
            StoreError::Blob(BlobError::Transport(_)) => 502,
            StoreError::Blob(err) => err.status().unwrap_or(500),
            StoreError::MalformedDocument(_) | StoreError::Encode(_) => 500,
        }
    }
}

/// Append/delete log on top of a versioned blob, using compare-and-swap
/// commits with bounded refetch-and-retry.
#[derive(Clone)]
pub struct RemoteDocumentStore {
    client: Arc<dyn BlobClient>,
    observer: Arc<dyn StoreObserver>,
    settings: StoreSettings,
}

impl RemoteDocumentStore {
    pub fn new(client: Arc<dyn BlobClient>, settings: StoreSettings) -> Self {
        Self {
            client,
            observer: Arc::new(LoggingObserver),
            settings,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StoreObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn today(&self) -> String {
        (self.settings.today)()
    }

    /// Insert `entry` at the head of the document unless its URL is already
    /// present in the snapshot read by the same attempt.
    pub async fn upsert_entry(
        &self,
        locator: &DocumentLocator,
        entry: Entry,
        message: Option<&str>,
    ) -> Result<StoreOutcome, StoreError> {
        let message = match message {
            Some(message) => message.to_string(),
            None => format!("Add reading entry: {} ({})", entry.title, self.today()),
        };
        self.run(locator, StoreOperation::Upsert, &Mutation::Insert(entry), &message)
            .await
    }

    /// Remove every entry matching `entry_url`. Deleting from a missing
    /// document, or deleting an entry that is not there, succeeds as a no-op.
    pub async fn delete_entry(
        &self,
        locator: &DocumentLocator,
        entry_url: &str,
        message: Option<&str>,
    ) -> Result<StoreOutcome, StoreError> {
        let message = match message {
            Some(message) => message.to_string(),
            None => format!("Remove reading entry: {} ({})", entry_url, self.today()),
        };
        let mutation = Mutation::Remove {
            url: entry_url.to_string(),
        };
        self.run(locator, StoreOperation::Delete, &mutation, &message)
            .await
    }

    /// Entries in stored order. Missing or unrecognized documents read as empty.
    pub async fn list_entries(&self, locator: &DocumentLocator) -> Result<Vec<Entry>, StoreError> {
        let snapshot = self.client.get_blob(locator).await?;
        let Some(content) = snapshot.content else {
            return Ok(Vec::new());
        };
        let document = self.decode(&content)?;
        if document.shape() == DocumentShape::Unrecognized {
            readlog_warn!("Document {} has an unrecognized shape", locator);
        }
        let (entries, skipped) = document.typed_entries();
        if skipped > 0 {
            readlog_warn!("Skipped {} unreadable entries in {}", skipped, locator);
        }
        Ok(entries)
    }

    async fn run(
        &self,
        locator: &DocumentLocator,
        operation: StoreOperation,
        mutation: &Mutation,
        message: &str,
    ) -> Result<StoreOutcome, StoreError> {
        let policy = self.settings.retry;
        let max_attempts = policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.observer
                .emit(StoreEvent::AttemptStarted { operation, attempt });

            // Dedup decision and commit share this snapshot's version.
            let snapshot = self.client.get_blob(locator).await?;
            let document = match snapshot.content.as_deref() {
                Some(bytes) => self.decode(bytes)?,
                None if operation == StoreOperation::Delete => {
                    return Ok(self.skip(operation, attempt, OutcomeStatus::NotFoundNoop, None));
                }
                None => ReadingDocument::empty(self.settings.new_document_shape),
            };

            let (document, change) = apply(document, mutation)?;
            if change.is_noop() {
                let status = OutcomeStatus::from_change(change);
                return Ok(self.skip(operation, attempt, status, snapshot.version));
            }
            let removed = match change {
                Change::Removed(count) => count,
                _ => 0,
            };

            let body = document.encode()?;
            match self
                .client
                .put_blob(locator, body.as_bytes(), message, snapshot.version.as_ref())
                .await
            {
                Ok(version) => {
                    self.observer.emit(StoreEvent::Committed {
                        operation,
                        attempt,
                        version: version.clone(),
                    });
                    return Ok(StoreOutcome {
                        status: OutcomeStatus::Committed,
                        version: Some(version),
                        attempts: attempt,
                        removed,
                    });
                }
                Err(BlobError::Conflict { .. }) => {
                    let will_retry = attempt < max_attempts;
                    self.observer.emit(StoreEvent::Conflict {
                        operation,
                        attempt,
                        will_retry,
                    });
                    if will_retry && !policy.backoff.is_zero() {
                        tokio::time::sleep(policy.backoff).await;
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(StoreError::ConflictExceeded {
            locator: locator.to_string(),
            attempts: max_attempts,
        })
    }

    /// An existing but blank file reads as a new empty document.
    fn decode(&self, content: &[u8]) -> Result<ReadingDocument, DocumentError> {
        if content.trim_ascii().is_empty() {
            return Ok(ReadingDocument::empty(self.settings.new_document_shape));
        }
        ReadingDocument::decode(content)
    }

    fn skip(
        &self,
        operation: StoreOperation,
        attempt: u32,
        status: OutcomeStatus,
        version: Option<VersionToken>,
    ) -> StoreOutcome {
        self.observer.emit(StoreEvent::Skipped {
            operation,
            attempt,
            status,
        });
        StoreOutcome {
            status,
            version,
            attempts: attempt,
            removed: 0,
        }
    }
}
