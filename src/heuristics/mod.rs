//! Ordered, short-circuiting shop detection heuristics.
//!
//! A [`HeuristicChain`] runs its steps in order and stops at the first one
//! that reaches a decision. Banned-term suppression therefore has to come
//! before any keyword step, which is how [`StepKind::ALL`] is ordered.

pub mod steps;

use crate::keywords::KeywordTable;
use crate::parsers::Document;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Outcome of classifying one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    ShopDetected { evidence: String },
    NoShopFound { banned_term: Option<String> },
    FetchError { message: String },
}

impl Classification {
    pub fn detected(evidence: impl Into<String>) -> Self {
        Classification::ShopDetected {
            evidence: evidence.into(),
        }
    }

    pub fn banned(term: impl Into<String>) -> Self {
        Classification::NoShopFound {
            banned_term: Some(term.into()),
        }
    }

    pub fn not_found() -> Self {
        Classification::NoShopFound { banned_term: None }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Classification::ShopDetected { .. })
    }
}

/// A single evaluator in the chain.
///
/// Returns `Some` to end the chain with a decision, `None` to pass.
pub trait Heuristic: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, url: &Url, doc: &Document, table: &KeywordTable)
    -> Option<Classification>;
}

/// The built-in steps, addressable by name from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Banned phrase anywhere in the page text
    BannedTerms,
    /// Shop keywords anywhere in the page text
    TextKeywords,
    /// Shop keywords in link text or href
    AnchorKeywords,
    /// Icon class regexes against element classes
    ClassPatterns,
    /// Image regexes against alt and src
    ImagePatterns,
    /// Product listing class fragments
    StructureIndicators,
    /// Links to a shop subdomain or shop path
    ShopLinks,
}

impl StepKind {
    pub const ALL: [StepKind; 7] = [
        StepKind::BannedTerms,
        StepKind::TextKeywords,
        StepKind::AnchorKeywords,
        StepKind::ClassPatterns,
        StepKind::ImagePatterns,
        StepKind::StructureIndicators,
        StepKind::ShopLinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::BannedTerms => "banned_terms",
            StepKind::TextKeywords => "text_keywords",
            StepKind::AnchorKeywords => "anchor_keywords",
            StepKind::ClassPatterns => "class_patterns",
            StepKind::ImagePatterns => "image_patterns",
            StepKind::StructureIndicators => "structure_indicators",
            StepKind::ShopLinks => "shop_links",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Heuristic for StepKind {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn evaluate(
        &self,
        url: &Url,
        doc: &Document,
        table: &KeywordTable,
    ) -> Option<Classification> {
        match self {
            StepKind::BannedTerms => steps::banned_terms(doc, table),
            StepKind::TextKeywords => steps::text_keywords(doc, table),
            StepKind::AnchorKeywords => steps::anchor_keywords(doc, table),
            StepKind::ClassPatterns => steps::class_patterns(doc, table),
            StepKind::ImagePatterns => steps::image_patterns(doc, table),
            StepKind::StructureIndicators => steps::structure_indicators(doc, table),
            StepKind::ShopLinks => steps::shop_links(url, doc, table),
        }
    }
}

/// Ordered list of heuristics, evaluated first-decision-wins
#[derive(Default)]
pub struct HeuristicChain {
    steps: Vec<Box<dyn Heuristic>>,
}

impl HeuristicChain {
    /// Build a chain of built-in steps in the given order
    pub fn from_steps(kinds: &[StepKind]) -> Self {
        let mut chain = Self::default();
        for kind in kinds {
            chain.push(Box::new(*kind));
        }
        chain
    }

    /// Append a step to the end of the chain
    pub fn push(&mut self, step: Box<dyn Heuristic>) {
        self.steps.push(step);
    }

    pub fn with_step(mut self, step: Box<dyn Heuristic>) -> Self {
        self.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Classify a page, stopping at the first step that decides
    pub fn classify(&self, url: &Url, doc: &Document, table: &KeywordTable) -> Classification {
        for step in &self.steps {
            match step.evaluate(url, doc, table) {
                Some(decision) => {
                    ::log::debug!("{}: decided by {} ({:?})", url, step.name(), decision);
                    return decision;
                }
                None => ::log::trace!("{}: no signal from {}", url, step.name()),
            }
        }
        Classification::not_found()
    }
}

impl fmt::Debug for HeuristicChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeuristicChain")
            .field("steps", &self.step_names())
            .finish()
    }
}
