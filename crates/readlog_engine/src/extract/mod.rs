//! Metadata extraction from fetched HTML.
//!
//! Each field is resolved by an ordered chain of pure strategies
//! `fn(&PageContext) -> Option<String>`; the first non-empty answer wins and
//! nothing is merged across strategies.
mod author;
mod published;
mod structured;
mod title;

use readlog_core::MetadataResult;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use structured::StructuredArticle;

pub(crate) type Strategy = fn(&PageContext<'_>) -> Option<String>;

pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, html: &str, source_url: &str) -> MetadataResult;
}

/// Heuristic title/author/date extractor for arbitrary article pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlMetadataExtractor;

impl MetadataExtractor for HtmlMetadataExtractor {
    fn extract(&self, html: &str, source_url: &str) -> MetadataResult {
        let document = Html::parse_document(html);
        let ctx = PageContext::new(&document, source_url);
        MetadataResult {
            title: first_non_empty(title::STRATEGIES, &ctx),
            author: first_non_empty(author::STRATEGIES, &ctx),
            published_date: first_non_empty(published::STRATEGIES, &ctx),
        }
    }
}

pub(crate) fn first_non_empty(strategies: &[Strategy], ctx: &PageContext<'_>) -> Option<String> {
    strategies
        .iter()
        .find_map(|strategy| strategy(ctx).filter(|value| !value.trim().is_empty()))
}

/// Everything the strategies look at, computed once per page.
pub(crate) struct PageContext<'a> {
    document: &'a Html,
    host: Option<String>,
    /// `(lowercased name|property|itemprop, trimmed content)` in document order.
    metas: Vec<(String, String)>,
    article: Option<StructuredArticle>,
}

impl<'a> PageContext<'a> {
    pub(crate) fn new(document: &'a Html, source_url: &str) -> Self {
        let host = Url::parse(source_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase));
        Self {
            document,
            host,
            metas: collect_metas(document),
            article: structured::find_article(document),
        }
    }

    pub(crate) fn article(&self) -> Option<&StructuredArticle> {
        self.article.as_ref()
    }

    pub(crate) fn meta<'s>(&'s self, key: &'s str) -> Option<&'s str> {
        self.meta_all(key).next()
    }

    pub(crate) fn meta_all<'s>(&'s self, key: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.metas
            .iter()
            .filter(move |(name, content)| name.eq_ignore_ascii_case(key) && !content.is_empty())
            .map(|(_, content)| content.as_str())
    }

    /// True when the page host is one of `domains` or a subdomain of one.
    pub(crate) fn host_is_any(&self, domains: &[&str]) -> bool {
        let Some(host) = self.host.as_deref() else {
            return false;
        };
        domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub(crate) fn select(&self, css: &str) -> Vec<ElementRef<'a>> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub(crate) fn first_text(&self, css: &str) -> Option<String> {
        self.select(css)
            .into_iter()
            .map(element_text)
            .find(|text| !text.is_empty())
    }

    pub(crate) fn page_title(&self) -> Option<String> {
        self.first_text("title")
    }
}

fn collect_metas(document: &Html) -> Vec<(String, String)> {
    let Ok(selector) = Selector::parse("meta") else {
        return Vec::new();
    };
    let mut metas = Vec::new();
    for meta in document.select(&selector) {
        let element = meta.value();
        let Some(content) = element.attr("content") else {
            continue;
        };
        let content = collapse_whitespace(content);
        for attr in ["name", "property", "itemprop"] {
            if let Some(key) = element.attr(attr) {
                metas.push((key.trim().to_ascii_lowercase(), content.clone()));
            }
        }
    }
    metas
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
