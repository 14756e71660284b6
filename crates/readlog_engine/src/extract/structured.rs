use scraper::{Html, Selector};
use serde_json::Value;

/// Fields read from the first article-typed JSON-LD object on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StructuredArticle {
    pub(crate) types: Vec<String>,
    pub(crate) headline: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) authors: Vec<String>,
    pub(crate) date_published: Option<String>,
    pub(crate) date_created: Option<String>,
}

impl StructuredArticle {
    pub(crate) fn is_scholarly(&self) -> bool {
        self.types.iter().any(|t| t == "ScholarlyArticle")
    }
}

const POSTING_TYPES: &[&str] = &["BlogPosting", "LiveBlogPosting", "SocialMediaPosting", "Report"];

fn is_article_type(kind: &str) -> bool {
    kind.ends_with("Article") || POSTING_TYPES.contains(&kind)
}

pub(crate) fn find_article(document: &Html) -> Option<StructuredArticle> {
    let selector = Selector::parse("script").ok()?;
    document
        .select(&selector)
        .filter(|script| {
            script
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
        })
        .filter_map(|script| serde_json::from_str::<Value>(&script.text().collect::<String>()).ok())
        .find_map(|value| first_article(&value))
}

fn first_article(value: &Value) -> Option<StructuredArticle> {
    match value {
        Value::Array(items) => items.iter().find_map(first_article),
        Value::Object(object) => {
            let types = type_names(object.get("@type"));
            if types.iter().any(|t| is_article_type(t)) {
                return Some(read_article(value, types));
            }
            object.get("@graph").and_then(first_article)
        }
        _ => None,
    }
}

fn type_names(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(name)) => vec![strip_vocab(name)],
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(strip_vocab)
            .collect(),
        _ => Vec::new(),
    }
}

// Accept both "Article" and "https://schema.org/Article".
fn strip_vocab(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

fn read_article(value: &Value, types: Vec<String>) -> StructuredArticle {
    StructuredArticle {
        types,
        headline: string_field(value, "headline"),
        name: string_field(value, "name"),
        authors: value.get("author").map(person_names).unwrap_or_default(),
        date_published: string_field(value, "datePublished"),
        date_created: string_field(value, "dateCreated"),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn person_names(value: &Value) -> Vec<String> {
    let names: Vec<String> = match value {
        Value::String(name) => vec![name.trim().to_string()],
        Value::Object(_) => string_field(value, "name").into_iter().collect(),
        Value::Array(items) => items.iter().flat_map(person_names).collect(),
        _ => Vec::new(),
    };
    names.into_iter().filter(|name| !name.is_empty()).collect()
}
