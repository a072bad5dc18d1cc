use crate::error::ConfigError;
use crate::heuristics::StepKind;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for a detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Phrases that indicate a shop when found in page text or links
    #[serde(default = "default_shop_keywords")]
    pub shop_keywords: Vec<String>,

    /// Phrases that suppress a positive result (e.g. "workshop")
    #[serde(default = "default_banned_keywords")]
    pub banned_keywords: Vec<String>,

    /// Regex patterns matched against element class strings
    #[serde(default = "default_icon_class_patterns")]
    pub icon_class_patterns: Vec<String>,

    /// Regex patterns matched against image alt and src attributes
    #[serde(default = "default_image_patterns")]
    pub image_patterns: Vec<String>,

    /// Class substrings that mark product listings or product pages
    #[serde(default = "default_structure_indicators")]
    pub structure_indicators: Vec<String>,

    /// Link path fragments that point at a shop section
    #[serde(default = "default_shop_path_segments")]
    pub shop_path_segments: Vec<String>,

    /// Heuristic steps to run, in order
    #[serde(default = "default_steps")]
    pub steps: Vec<StepKind>,

    /// Maximum number of in-flight fetches
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional deadline for the whole batch, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether HTTP redirects are followed before classification
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,

    /// Redirect hop limit when redirects are followed
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_shop_keywords() -> Vec<String> {
    [
        "add to cart",
        "cart",
        "web shop",
        "store",
        "basket",
        "warenkorb",
        "buy now",
        "checkout",
        "shop",
        "shopping cart",
        "shop now",
        "in den warenkorb",
        "jetzt kaufen",
        "kasse",
        "panier",
        "ajouter au panier",
        "carrito",
        "añadir al carrito",
        "winkelwagen",
        "carrello",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_banned_keywords() -> Vec<String> {
    vec!["workshop".to_string(), "shoping".to_string()]
}

fn default_icon_class_patterns() -> Vec<String> {
    [
        r"fa-shopping-(cart|bag|basket)",
        r"icon-(cart|basket|bag)\b",
        r"mini-?cart",
        r"cart-(icon|count|link|toggle)",
        r"shopping-?(cart|bag)",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_image_patterns() -> Vec<String> {
    [
        r"add[-_ ]?to[-_ ]?cart",
        r"shopping[-_ ]?(cart|bag)",
        r"\bcart\b",
        r"\bbasket\b",
        r"checkout",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_structure_indicators() -> Vec<String> {
    [
        "price",
        "product-item",
        "add-to-cart",
        "qty",
        "product-grid",
        "product-title",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_shop_path_segments() -> Vec<String> {
    ["/shop", "/store", "/products", "/catalog"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_steps() -> Vec<StepKind> {
    StepKind::ALL.to_vec()
}

fn default_max_concurrency() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string()
}

fn default_follow_redirects() -> bool {
    true
}

fn default_max_redirects() -> usize {
    10
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            shop_keywords: default_shop_keywords(),
            banned_keywords: default_banned_keywords(),
            icon_class_patterns: default_icon_class_patterns(),
            image_patterns: default_image_patterns(),
            structure_indicators: default_structure_indicators(),
            shop_path_segments: default_shop_path_segments(),
            steps: default_steps(),
            max_concurrency: default_max_concurrency(),
            timeout_secs: default_timeout_secs(),
            total_timeout_secs: None,
            user_agent: default_user_agent(),
            follow_redirects: default_follow_redirects(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl DetectorConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Check the settings that do not depend on pattern compilation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shop_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::EmptyKeywords);
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if self.timeout_secs == 0 || self.total_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.steps.is_empty() {
            return Err(ConfigError::NoSteps);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn total_timeout(&self) -> Option<Duration> {
        self.total_timeout_secs.map(Duration::from_secs)
    }
}
