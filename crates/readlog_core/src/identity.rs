use url::Url;

/// Identity key of an entry URL.
///
/// Scheme and host are lowercased by URL parsing, the fragment is dropped and
/// trailing slashes are stripped. Path and query stay case-sensitive. Input
/// that does not parse as an absolute URL is only trimmed.
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => trimmed.trim_end_matches('/').to_string(),
    }
}

/// True when both URLs name the same entry.
pub fn same_entry_url(a: &str, b: &str) -> bool {
    normalize_url_for_dedupe(a) == normalize_url_for_dedupe(b)
}
