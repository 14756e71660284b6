use std::sync::Arc;

use readlog_core::{Entry, EntryDraft, EntryError};
use readlog_logging::readlog_info;

use crate::fetch::MetadataFetcher;
use crate::store::{RemoteDocumentStore, StoreError, StoreOutcome};
use crate::DocumentLocator;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Entry(_) => 400,
            ServiceError::Store(err) => err.status_code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEntry {
    pub entry: Entry,
    pub outcome: StoreOutcome,
}

/// Entry creation flow: optional metadata enrichment, then a synchronized
/// write to the remote document.
#[derive(Clone)]
pub struct ReadingLog {
    store: RemoteDocumentStore,
    fetcher: Arc<dyn MetadataFetcher>,
}

impl ReadingLog {
    pub fn new(store: RemoteDocumentStore, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self { store, fetcher }
    }

    pub fn store(&self) -> &RemoteDocumentStore {
        &self.store
    }

    pub async fn log_entry(
        &self,
        locator: &DocumentLocator,
        draft: EntryDraft,
        message: Option<&str>,
    ) -> Result<LoggedEntry, ServiceError> {
        draft.validate()?;
        let metadata = if draft.fetch_metadata {
            Some(self.fetcher.fetch_safe(draft.url.trim()).await)
        } else {
            None
        };

        let entry = draft.into_entry(metadata.as_ref(), &self.store.today())?;
        let outcome = self
            .store
            .upsert_entry(locator, entry.clone(), message)
            .await?;
        readlog_info!(
            "Logged {} to {} ({})",
            entry.url,
            locator,
            outcome.status.as_str()
        );
        Ok(LoggedEntry { entry, outcome })
    }

    pub async fn remove_entry(
        &self,
        locator: &DocumentLocator,
        url: &str,
        message: Option<&str>,
    ) -> Result<StoreOutcome, ServiceError> {
        let outcome = self.store.delete_entry(locator, url, message).await?;
        readlog_info!(
            "Removed {} from {} ({})",
            url,
            locator,
            outcome.status.as_str()
        );
        Ok(outcome)
    }

    pub async fn history(&self, locator: &DocumentLocator) -> Result<Vec<Entry>, ServiceError> {
        Ok(self.store.list_entries(locator).await?)
    }
}
