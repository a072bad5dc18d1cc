use url::Url;

/// Host of `url`, lower-cased, with a leading `www.` removed.
/// Empty when the URL has no host.
pub fn base_domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or("").to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Shortens `text` to at most `max` characters for log output
pub fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
