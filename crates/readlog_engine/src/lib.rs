//! Readlog engine: remote document synchronization and metadata enrichment.
mod blob;
mod decode;
mod extract;
mod fetch;
mod service;
mod store;
mod types;

pub use blob::{BlobClient, BlobError, GitHubBlobClient, GitHubSettings};
pub use decode::{decode_page, DecodedPage};
pub use extract::{HtmlMetadataExtractor, MetadataExtractor};
pub use fetch::{FetchSettings, HttpMetadataFetcher, MetadataFetcher};
pub use service::{LoggedEntry, ReadingLog, ServiceError};
pub use store::{
    LoggingObserver, OutcomeStatus, RemoteDocumentStore, RetryPolicy, StoreError, StoreEvent,
    StoreObserver, StoreOperation, StoreOutcome, StoreSettings,
};
pub use types::{
    fixed_today, local_today, BlobSnapshot, DateSource, DocumentLocator, FailureKind,
    MetadataFetchError, VersionToken,
};
