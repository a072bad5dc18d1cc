use crate::parsers::{Anchor, ClassedElement, Document, ElementKind, Image};
use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text content is never shown to a visitor
const INVISIBLE_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Parses HTML content into a lower-cased `Document`.
///
/// html5ever recovers from any input, so malformed or truncated markup
/// still produces a tree; garbage simply yields little or no content.
pub fn parse(html: &str) -> Document {
    let doc = Html::parse_document(html);

    let document = Document {
        text: visible_text(&doc),
        anchors: anchors(&doc),
        classed: classed_elements(&doc),
        images: images(&doc),
    };

    ::log::trace!(
        "HTML parser found {} anchors, {} classed elements, {} images",
        document.anchors.len(),
        document.classed.len(),
        document.images.len()
    );

    document
}

/// Concatenates every text node outside script/style-like elements
fn visible_text(doc: &Html) -> String {
    let mut text_content = String::new();
    for node in doc.tree.root().descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| INVISIBLE_TAGS.contains(&e.name()))
            });
            if !hidden {
                text_content.push_str(text);
            }
        }
    }
    // Adjacent nodes are glued as-is: `Work<b>shop</b>` reads "workshop"
    collapse_whitespace(&text_content).to_lowercase()
}

fn anchors(doc: &Html) -> Vec<Anchor> {
    let Ok(selector) = Selector::parse("a") else {
        return Vec::new();
    };
    doc.select(&selector)
        .map(|e| Anchor {
            text: element_text(&e),
            href: e.value().attr("href").unwrap_or("").trim().to_lowercase(),
        })
        .collect()
}

fn classed_elements(doc: &Html) -> Vec<ClassedElement> {
    let Ok(selector) = Selector::parse("div[class], span[class], section[class]") else {
        return Vec::new();
    };
    doc.select(&selector)
        .filter_map(|e| {
            let kind = ElementKind::from_tag(e.value().name())?;
            let classes = e
                .value()
                .classes()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            (!classes.is_empty()).then_some(ClassedElement { kind, classes })
        })
        .collect()
}

fn images(doc: &Html) -> Vec<Image> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };
    doc.select(&selector)
        .map(|e| Image {
            alt: e.value().attr("alt").unwrap_or("").to_lowercase(),
            src: e.value().attr("src").unwrap_or("").to_lowercase(),
        })
        .collect()
}

fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>()).to_lowercase()
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
