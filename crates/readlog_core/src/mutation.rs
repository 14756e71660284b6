use crate::document::{entry_url, DocumentError, ReadingDocument};
use crate::entry::Entry;
use crate::identity::same_entry_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Insert at the head unless the URL is already present.
    Insert(Entry),
    /// Remove every entry whose URL matches.
    Remove { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Inserted,
    Duplicate,
    Removed(usize),
    Absent,
    UnknownFormat,
}

impl Change {
    /// True when the document was left untouched and nothing needs committing.
    pub fn is_noop(&self) -> bool {
        !matches!(self, Change::Inserted | Change::Removed(_))
    }
}

/// Pure mutation step: applies one mutation to a decoded snapshot.
pub fn apply(
    mut document: ReadingDocument,
    mutation: &Mutation,
) -> Result<(ReadingDocument, Change), DocumentError> {
    let Some(entries) = document.entries_mut() else {
        return Ok((document, Change::UnknownFormat));
    };

    let change = match mutation {
        Mutation::Insert(entry) => {
            let exists = entries
                .iter()
                .filter_map(entry_url)
                .any(|url| same_entry_url(url, &entry.url));
            if exists {
                Change::Duplicate
            } else {
                let value = serde_json::to_value(entry)
                    .map_err(|err| DocumentError::Encode(err.to_string()))?;
                entries.insert(0, value);
                Change::Inserted
            }
        }
        Mutation::Remove { url } => {
            let before = entries.len();
            entries.retain(|value| {
                entry_url(value).map_or(true, |existing| !same_entry_url(existing, url))
            });
            match before - entries.len() {
                0 => Change::Absent,
                removed => Change::Removed(removed),
            }
        }
    };

    Ok((document, change))
}
