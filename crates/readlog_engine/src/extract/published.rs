use std::sync::LazyLock;

use readlog_core::normalize_date;
use regex::Regex;

use super::{PageContext, Strategy};

pub(crate) const STRATEGIES: &[Strategy] = &[
    structured_date,
    meta_date,
    time_element,
    published_label,
];

/// Checked in order; the first one holding a parseable date wins.
const DATE_META_KEYS: &[&str] = &[
    "citation_publication_date",
    "citation_date",
    "citation_online_date",
    "dc.date",
    "dc.date.issued",
    "dcterms.date",
    "dcterms.issued",
    "dcterms.created",
    "article:published_time",
    "og:published_time",
    "datepublished",
    "publisheddate",
    "pubdate",
    "date",
];

static PUBLISHED_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)published:?\s+([a-z]+\s+\d{1,2},\s*\d{4})").expect("valid published regex")
});

fn structured_date(ctx: &PageContext<'_>) -> Option<String> {
    let article = ctx.article()?;
    [&article.date_published, &article.date_created]
        .into_iter()
        .flatten()
        .find_map(|raw| normalize_date(raw))
}

fn meta_date(ctx: &PageContext<'_>) -> Option<String> {
    DATE_META_KEYS
        .iter()
        .flat_map(|key| ctx.meta_all(key))
        .find_map(normalize_date)
}

fn time_element(ctx: &PageContext<'_>) -> Option<String> {
    ctx.select("time[datetime]")
        .into_iter()
        .filter_map(|time| time.value().attr("datetime"))
        .find_map(normalize_date)
}

fn published_label(ctx: &PageContext<'_>) -> Option<String> {
    let body = ctx.first_text("body")?;
    PUBLISHED_LABEL
        .captures_iter(&body)
        .find_map(|caps| caps.get(1).and_then(|m| normalize_date(m.as_str())))
}
