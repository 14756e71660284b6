//! Readlog core: pure reading-log domain, document shapes and mutation rules.
mod date;
mod document;
mod entry;
mod identity;
mod mutation;

pub use date::normalize_date;
pub use document::{DocumentError, DocumentShape, ReadingDocument};
pub use entry::{Entry, EntryDraft, EntryError, MetadataResult};
pub use identity::{normalize_url_for_dedupe, same_entry_url};
pub use mutation::{apply, Change, Mutation};
