use scraper::ElementRef;

use super::{element_text, PageContext, Strategy};

pub(crate) const STRATEGIES: &[Strategy] = &[
    structured_headline,
    preprint_title,
    citation_title,
    dublin_core_title,
    open_graph_title,
    content_heading,
    page_title,
];

const PREPRINT_HOSTS: &[&str] = &["arxiv.org"];
const MAIN_REGIONS: &[&str] = &["main", "article"];
const CHROME_MARKERS: &[&str] = &["site", "logo", "menu"];

fn structured_headline(ctx: &PageContext<'_>) -> Option<String> {
    let article = ctx.article()?;
    article.headline.clone().or_else(|| article.name.clone())
}

fn preprint_title(ctx: &PageContext<'_>) -> Option<String> {
    if !ctx.host_is_any(PREPRINT_HOSTS) {
        return None;
    }
    let text = ctx.first_text("h1.title")?;
    let stripped = text
        .strip_prefix("Title:")
        .map(str::trim_start)
        .unwrap_or(&text);
    Some(stripped.to_string())
}

fn citation_title(ctx: &PageContext<'_>) -> Option<String> {
    ctx.meta("citation_title").map(str::to_string)
}

fn dublin_core_title(ctx: &PageContext<'_>) -> Option<String> {
    ctx.meta("dc.title")
        .or_else(|| ctx.meta("dcterms.title"))
        .map(str::to_string)
}

/// Skipped when identical to `<title>`.
fn open_graph_title(ctx: &PageContext<'_>) -> Option<String> {
    let og = ctx.meta("og:title")?;
    match ctx.page_title() {
        Some(plain) if plain == og => None,
        _ => Some(og.to_string()),
    }
}

fn content_heading(ctx: &PageContext<'_>) -> Option<String> {
    let headings: Vec<ElementRef<'_>> = ctx
        .select("h1")
        .into_iter()
        .filter(|heading| !is_site_chrome(heading))
        .collect();

    headings
        .iter()
        .filter(|heading| in_main_region(heading))
        .chain(headings.iter())
        .map(|heading| element_text(*heading))
        .find(|text| !text.is_empty())
}

fn page_title(ctx: &PageContext<'_>) -> Option<String> {
    ctx.page_title()
}

fn is_site_chrome(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    let class = value.attr("class").unwrap_or_default().to_ascii_lowercase();
    let id = value.attr("id").unwrap_or_default().to_ascii_lowercase();
    CHROME_MARKERS
        .iter()
        .any(|marker| class.contains(marker) || id.contains(marker))
}

fn in_main_region(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| {
            let value = ancestor.value();
            MAIN_REGIONS.contains(&value.name()) || value.attr("role") == Some("main")
        })
}
