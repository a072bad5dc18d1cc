pub mod html;


/// The kinds of class-bearing elements inspected by the structural heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `div`
    Container,
    /// `span`
    Inline,
    /// `section`
    Section,
}

impl ElementKind {
    /// Maps a tag name to its kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "div" => Some(ElementKind::Container),
            "span" => Some(ElementKind::Inline),
            "section" => Some(ElementKind::Section),
            _ => None,
        }
    }
}

/// An `<a>` element, lower-cased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub href: String,
}

/// An element with a `class` attribute, classes joined with single spaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassedElement {
    pub kind: ElementKind,
    pub classes: String,
}

/// An `<img>` element, lower-cased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub alt: String,
    pub src: String,
}

/// Normalized view of a fetched page. All fields are lower-cased and kept in
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Visible text, whitespace collapsed
    pub text: String,
    pub anchors: Vec<Anchor>,
    pub classed: Vec<ClassedElement>,
    pub images: Vec<Image>,
}

impl Document {
    /// Builds a document from raw HTML. Never fails; markup that cannot be
    /// made sense of yields an empty document.
    pub fn parse(html: &str) -> Self {
        html::parse(html)
    }

    /// Builds a document holding only text, as if the page were plain text
    pub fn from_text(text: &str) -> Self {
        Self {
            text: html::collapse_whitespace(text).to_lowercase(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.anchors.is_empty()
            && self.classed.is_empty()
            && self.images.is_empty()
    }
}
