use std::time::Duration;
use thiserror::Error;

/// Errors raised while fetching a single page. Each one becomes an
/// `Error: ...` row for that URL and never aborts the batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    /// Transport failure, with the full chain of causes
    #[error("{0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors in the detector configuration. These are reported before any
/// request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("shop keyword list is empty")]
    EmptyKeywords,
    #[error("max_concurrency must be at least 1")]
    InvalidConcurrency,
    #[error("timeout must be greater than zero")]
    InvalidTimeout,
    #[error("no heuristic steps are enabled")]
    NoSteps,
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
