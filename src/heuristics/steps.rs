//! Built-in heuristic steps. Each returns `None` when it has no signal.
//!
//! All matching is plain substring containment over lower-cased content, so
//! "cart" also matches inside "cartography".

use super::Classification;
use crate::keywords::KeywordTable;
use crate::parsers::Document;
use crate::utils::base_domain;
use url::Url;

pub fn banned_terms(doc: &Document, table: &KeywordTable) -> Option<Classification> {
    table.banned_in(&doc.text).map(Classification::banned)
}

pub fn text_keywords(doc: &Document, table: &KeywordTable) -> Option<Classification> {
    let found = table.shop_keywords_in(&doc.text);
    if found.is_empty() {
        return None;
    }
    Some(Classification::detected(found.join(", ")))
}

/// First keyword found in any link's text or href, links in document order
pub fn anchor_keywords(doc: &Document, table: &KeywordTable) -> Option<Classification> {
    doc.anchors.iter().find_map(|anchor| {
        table
            .shop_keywords
            .iter()
            .find(|k| anchor.text.contains(k.as_str()) || anchor.href.contains(k.as_str()))
            .map(Classification::detected)
    })
}

pub fn class_patterns(doc: &Document, table: &KeywordTable) -> Option<Classification> {
    doc.classed.iter().find_map(|element| {
        table
            .icon_class_patterns
            .iter()
            .find(|pattern| pattern.is_match(&element.classes))
            .map(|pattern| Classification::detected(format!("class pattern: {}", pattern.as_str())))
    })
}

pub fn image_patterns(doc: &Document, table: &KeywordTable) -> Option<Classification> {
    for image in &doc.images {
        for pattern in &table.image_patterns {
            if pattern.is_match(&image.alt) {
                return Some(Classification::detected(format!(
                    "image alt pattern: {}",
                    pattern.as_str()
                )));
            }
            if pattern.is_match(&image.src) {
                return Some(Classification::detected(format!(
                    "image src pattern: {}",
                    pattern.as_str()
                )));
            }
        }
    }
    None
}

/// Product listing markup, reported with the full class string
pub fn structure_indicators(doc: &Document, table: &KeywordTable) -> Option<Classification> {
    doc.classed
        .iter()
        .find(|element| {
            table
                .structure_indicators
                .iter()
                .any(|indicator| element.classes.contains(indicator.as_str()))
        })
        .map(|element| Classification::detected(element.classes.clone()))
}

/// Links to a `shop.` subdomain of the page's own domain, or to a shop path.
///
/// Relative hrefs are resolved against `page_url`. Only http(s) targets are
/// considered. The subdomain check is skipped when the page has no host.
pub fn shop_links(page_url: &Url, doc: &Document, table: &KeywordTable) -> Option<Classification> {
    let domain = base_domain(page_url);

    for anchor in &doc.anchors {
        if anchor.href.is_empty() {
            continue;
        }
        let Ok(resolved) = page_url.join(&anchor.href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        let host = resolved.host_str().unwrap_or("").to_lowercase();
        if !domain.is_empty() && has_shop_label(&host) && host.contains(&domain) {
            return Some(Classification::detected(host));
        }

        let path = resolved.path().to_lowercase();
        if table
            .shop_path_segments
            .iter()
            .any(|segment| path.contains(segment.as_str()))
        {
            return Some(Classification::detected(path));
        }
    }
    None
}

/// True when one of the host's non-final labels is exactly `shop`
fn has_shop_label(host: &str) -> bool {
    host.starts_with("shop.") || host.contains(".shop.")
}
