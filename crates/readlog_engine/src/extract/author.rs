use super::{collapse_whitespace, PageContext, Strategy};

pub(crate) const STRATEGIES: &[Strategy] = &[
    structured_authors,
    citation_authors,
    dublin_core_creator,
    social_meta_author,
    rel_author_link,
    byline_element,
];

/// Preprint and peer-review hosts whose pages are treated as papers.
const ACADEMIC_HOSTS: &[&str] = &[
    "arxiv.org",
    "openreview.net",
    "biorxiv.org",
    "medrxiv.org",
    "ssrn.com",
];
const MAX_LISTED_AUTHORS: usize = 4;
const DUBLIN_CORE_KEYS: &[&str] = &["dc.creator", "dcterms.creator", "dc.author"];
const SOCIAL_KEYS: &[&str] = &["author", "article:author", "og:author", "twitter:creator"];

fn is_academic(ctx: &PageContext<'_>) -> bool {
    ctx.meta("citation_author").is_some()
        || ctx.host_is_any(ACADEMIC_HOSTS)
        || ctx.article().is_some_and(|article| article.is_scholarly())
}

fn structured_authors(ctx: &PageContext<'_>) -> Option<String> {
    let article = ctx.article()?;
    let names: Vec<String> = article
        .authors
        .iter()
        .map(|name| normalize_person_name(name))
        .filter(|name| !name.is_empty())
        .collect();
    if is_academic(ctx) {
        et_al(&names)
    } else if names.is_empty() {
        None
    } else {
        let listed: Vec<&str> = names.iter().take(MAX_LISTED_AUTHORS).map(String::as_str).collect();
        Some(listed.join(", "))
    }
}

fn citation_authors(ctx: &PageContext<'_>) -> Option<String> {
    let names: Vec<String> = ctx
        .meta_all("citation_author")
        .map(normalize_person_name)
        .filter(|name| !name.is_empty())
        .collect();
    et_al(&names)
}

fn dublin_core_creator(ctx: &PageContext<'_>) -> Option<String> {
    DUBLIN_CORE_KEYS
        .iter()
        .find_map(|key| ctx.meta(key))
        .map(normalize_person_name)
}

fn social_meta_author(ctx: &PageContext<'_>) -> Option<String> {
    SOCIAL_KEYS
        .iter()
        .flat_map(|key| ctx.meta_all(key))
        .map(|value| value.trim_start_matches('@'))
        // Profile links are not names.
        .find(|value| !value.is_empty() && !looks_like_url(value))
        .map(normalize_person_name)
}

fn rel_author_link(ctx: &PageContext<'_>) -> Option<String> {
    ctx.first_text(r#"a[rel~="author"]"#)
        .map(|name| normalize_person_name(&name))
}

fn byline_element(ctx: &PageContext<'_>) -> Option<String> {
    let text = ctx.first_text(".author, .byline")?;
    let name = text
        .strip_prefix("By ")
        .or_else(|| text.strip_prefix("by "))
        .unwrap_or(&text);
    Some(normalize_person_name(name))
}

fn et_al(names: &[String]) -> Option<String> {
    match names {
        [] => None,
        [only] => Some(only.clone()),
        [first, ..] => Some(format!("{first} et al.")),
    }
}

fn looks_like_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Collapse whitespace and turn `"Last, First"` into `"First Last"`.
pub(crate) fn normalize_person_name(raw: &str) -> String {
    let name = collapse_whitespace(raw);
    let mut parts = name.splitn(3, ',').map(str::trim);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(last), Some(first), None) if !last.is_empty() && !first.is_empty() => {
            format!("{first} {last}")
        }
        _ => name,
    }
}
