use serde::{Deserialize, Serialize};
use url::Url;

use crate::date::normalize_date;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// One logged item as persisted in the remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default)]
    pub added_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

/// Validated entry-creation payload handed over by the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub thoughts: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default = "default_fetch_metadata")]
    pub fetch_metadata: bool,
}

fn default_fetch_metadata() -> bool {
    true
}

/// Best-effort output of metadata extraction. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResult {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
}

impl MetadataResult {
    /// Degraded result used when a page could not be fetched.
    pub fn placeholder(url: &str) -> Self {
        Self {
            title: Some(url.to_string()),
            author: None,
            published_date: None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("invalid entry url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("rating {0} is outside 1..=5")]
    InvalidRating(u8),
}

impl EntryDraft {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            author: None,
            published_date: None,
            thoughts: None,
            rating: None,
            fetch_metadata: true,
        }
    }

    /// Checks the URL is absolute and the rating in range.
    pub fn validate(&self) -> Result<(), EntryError> {
        self.parsed_url()?;
        match self.rating {
            Some(rating) if !(MIN_RATING..=MAX_RATING).contains(&rating) => {
                Err(EntryError::InvalidRating(rating))
            }
            _ => Ok(()),
        }
    }

    fn parsed_url(&self) -> Result<Url, EntryError> {
        Url::parse(self.url.trim()).map_err(|err| EntryError::InvalidUrl {
            url: self.url.clone(),
            message: err.to_string(),
        })
    }

    /// Build the persisted entry. Caller-supplied fields always win over
    /// extracted metadata; an unresolved title falls back to the URL text.
    pub fn into_entry(
        self,
        metadata: Option<&MetadataResult>,
        added_date: &str,
    ) -> Result<Entry, EntryError> {
        self.validate()?;
        let url = self.parsed_url()?;

        let extracted = metadata.cloned().unwrap_or_default();
        let url = url.to_string();
        let title = non_empty(self.title)
            .or_else(|| non_empty(extracted.title))
            .unwrap_or_else(|| url.clone());
        let author = non_empty(self.author).or_else(|| non_empty(extracted.author));
        // Caller dates are canonicalized when possible and kept verbatim otherwise.
        let published_date = non_empty(self.published_date)
            .map(|raw| normalize_date(&raw).unwrap_or(raw))
            .or_else(|| non_empty(extracted.published_date));

        Ok(Entry {
            url,
            title,
            author,
            published_date,
            added_date: added_date.to_string(),
            thoughts: non_empty(self.thoughts),
            rating: self.rating,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Entry, EntryDraft, EntryError, MetadataResult};
    use pretty_assertions::assert_eq;

    fn extracted() -> MetadataResult {
        MetadataResult {
            title: Some("Extracted Title".to_string()),
            author: Some("Ada Lovelace".to_string()),
            published_date: Some("2023-03-01".to_string()),
        }
    }

    #[test]
    fn caller_fields_take_precedence_over_metadata() {
        let mut draft = EntryDraft::new("https://example.com/post");
        draft.title = Some("Mine".to_string());
        draft.published_date = Some("March 2, 2023".to_string());

        let entry = draft.into_entry(Some(&extracted()), "2024-05-01").unwrap();
        assert_eq!(entry.title, "Mine");
        assert_eq!(entry.author.as_deref(), Some("Ada Lovelace"));
        assert_eq!(entry.published_date.as_deref(), Some("2023-03-02"));
        assert_eq!(entry.added_date, "2024-05-01");
    }

    #[test]
    fn title_falls_back_to_url() {
        let entry = EntryDraft::new("https://example.com/post")
            .into_entry(None, "2024-05-01")
            .unwrap();
        assert_eq!(entry.title, "https://example.com/post");
    }

    #[test]
    fn rating_outside_range_is_rejected() {
        let mut draft = EntryDraft::new("https://example.com/post");
        draft.rating = Some(6);
        assert_eq!(
            draft.into_entry(None, "2024-05-01"),
            Err(EntryError::InvalidRating(6))
        );
    }

    #[test]
    fn relative_url_is_rejected() {
        let result = EntryDraft::new("/just/a/path").into_entry(None, "2024-05-01");
        assert!(matches!(result, Err(EntryError::InvalidUrl { .. })));
    }

    #[test]
    fn unset_optionals_are_omitted_when_serialized() {
        let entry = Entry {
            url: "https://example.com/".to_string(),
            title: "T".to_string(),
            author: None,
            published_date: Some("2024-01-15".to_string()),
            added_date: "2024-02-01".to_string(),
            thoughts: None,
            rating: Some(4),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"url":"https://example.com/","title":"T","publishedDate":"2024-01-15","addedDate":"2024-02-01","rating":4}"#
        );
    }
}
