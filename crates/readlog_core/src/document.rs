use serde_json::{Map, Value};

use crate::entry::Entry;

const ENTRIES_KEY: &str = "entries";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    BareList,
    WrappedEntries,
    Unrecognized,
}

/// The persisted collection, with its shape decided once at decode time.
///
/// Entries are kept as raw JSON values so that fields this crate does not
/// know about survive a read-modify-write cycle untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingDocument {
    /// `[entry, ...]`
    BareList(Vec<Value>),
    /// `{"entries": [entry, ...], ...}`; `envelope` holds the remaining keys
    /// in their original order.
    WrappedEntries {
        entries: Vec<Value>,
        envelope: Map<String, Value>,
    },
    /// Any other JSON value. Never rewritten.
    Unrecognized(Value),
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    Malformed(String),
    #[error("failed to encode document: {0}")]
    Encode(String),
}

impl ReadingDocument {
    /// Empty document of the given shape, used when the remote path is absent.
    pub fn empty(shape: DocumentShape) -> Self {
        match shape {
            DocumentShape::BareList => ReadingDocument::BareList(Vec::new()),
            DocumentShape::WrappedEntries | DocumentShape::Unrecognized => {
                ReadingDocument::WrappedEntries {
                    entries: Vec::new(),
                    envelope: Map::new(),
                }
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DocumentError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|err| DocumentError::Malformed(err.to_string()))?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(entries) => ReadingDocument::BareList(entries),
            Value::Object(mut envelope) => {
                let entries = match envelope.get_mut(ENTRIES_KEY) {
                    Some(Value::Array(entries)) => Some(std::mem::take(entries)),
                    _ => None,
                };
                match entries {
                    Some(entries) => ReadingDocument::WrappedEntries { entries, envelope },
                    None => ReadingDocument::Unrecognized(Value::Object(envelope)),
                }
            }
            other => ReadingDocument::Unrecognized(other),
        }
    }

    /// Pretty JSON with two-space indentation; non-ASCII text is written as-is.
    pub fn encode(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(&self.to_value())
            .map_err(|err| DocumentError::Encode(err.to_string()))
    }

    pub fn to_value(&self) -> Value {
        match self {
            ReadingDocument::BareList(entries) => Value::Array(entries.clone()),
            ReadingDocument::WrappedEntries { entries, envelope } => {
                let mut object = envelope.clone();
                // Re-inserting an existing key keeps its original position.
                object.insert(ENTRIES_KEY.to_string(), Value::Array(entries.clone()));
                Value::Object(object)
            }
            ReadingDocument::Unrecognized(value) => value.clone(),
        }
    }

    pub fn shape(&self) -> DocumentShape {
        match self {
            ReadingDocument::BareList(_) => DocumentShape::BareList,
            ReadingDocument::WrappedEntries { .. } => DocumentShape::WrappedEntries,
            ReadingDocument::Unrecognized(_) => DocumentShape::Unrecognized,
        }
    }

    /// Raw entries; empty for an unrecognized document.
    pub fn entries(&self) -> &[Value] {
        match self {
            ReadingDocument::BareList(entries) => entries,
            ReadingDocument::WrappedEntries { entries, .. } => entries,
            ReadingDocument::Unrecognized(_) => &[],
        }
    }

    pub(crate) fn entries_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            ReadingDocument::BareList(entries) => Some(entries),
            ReadingDocument::WrappedEntries { entries, .. } => Some(entries),
            ReadingDocument::Unrecognized(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Entries readable as [`Entry`], in stored order, plus the number of
    /// values that had to be skipped.
    pub fn typed_entries(&self) -> (Vec<Entry>, usize) {
        let mut skipped = 0;
        let entries = self
            .entries()
            .iter()
            .filter_map(|value| match serde_json::from_value::<Entry>(value.clone()) {
                Ok(entry) => Some(entry),
                Err(_) => {
                    skipped += 1;
                    None
                }
            })
            .collect();
        (entries, skipped)
    }
}

/// The `url` field of a stored entry, if it has one.
pub(crate) fn entry_url(value: &Value) -> Option<&str> {
    value.get("url").and_then(Value::as_str)
}
