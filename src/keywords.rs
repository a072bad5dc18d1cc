use crate::config::DetectorConfig;
use crate::error::ConfigError;
use regex::{Regex, RegexBuilder};

/// Read-only keyword and pattern lists shared by every worker.
///
/// Phrases are lower-cased once here so the heuristics can compare against
/// lower-cased page content directly. Patterns are compiled case-insensitive.
#[derive(Debug)]
pub struct KeywordTable {
    pub shop_keywords: Vec<String>,
    pub banned_keywords: Vec<String>,
    pub icon_class_patterns: Vec<Regex>,
    pub image_patterns: Vec<Regex>,
    pub structure_indicators: Vec<String>,
    pub shop_path_segments: Vec<String>,
}

impl KeywordTable {
    /// Build the table from configuration, compiling every pattern
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ConfigError> {
        let shop_keywords = lowercase_phrases(&config.shop_keywords);
        if shop_keywords.is_empty() {
            return Err(ConfigError::EmptyKeywords);
        }

        Ok(Self {
            shop_keywords,
            banned_keywords: lowercase_phrases(&config.banned_keywords),
            icon_class_patterns: compile_patterns(&config.icon_class_patterns)?,
            image_patterns: compile_patterns(&config.image_patterns)?,
            structure_indicators: lowercase_phrases(&config.structure_indicators),
            shop_path_segments: lowercase_phrases(&config.shop_path_segments),
        })
    }

    /// First banned keyword contained in `text`
    pub fn banned_in(&self, text: &str) -> Option<&str> {
        self.banned_keywords
            .iter()
            .find(|k| text.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Every shop keyword contained in `text`, in table order
    pub fn shop_keywords_in<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.shop_keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Lower-case and trim phrases, dropping empty entries (an empty phrase
/// would match every page)
fn lowercase_phrases(phrases: &[String]) -> Vec<String> {
    phrases
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    let mut compiled = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        compiled.push(regex);
    }
    Ok(compiled)
}
