// Re-export modules
pub mod batch;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod heuristics;
pub mod keywords;
pub mod parsers;
pub mod results;
pub mod tabular;
pub mod utils;

// Re-export commonly used types for convenience
pub use batch::BatchRunner;
pub use config::DetectorConfig;
pub use error::{ConfigError, FetchError};
pub use fetcher::{HttpFetcher, PageSource, RawPage};
pub use heuristics::{Classification, Heuristic, HeuristicChain, StepKind};
pub use keywords::KeywordTable;
pub use parsers::Document;
pub use results::{ResultRecord, Status};

use std::time::Duration;

/// Main builder for shop detection runs
pub struct Detector {
    config: DetectorConfig,
    timeout: Duration,
    total_timeout: Option<Duration>,
    extra_steps: Vec<Box<dyn Heuristic>>,
}

impl Detector {
    /// Create a new Detector builder from a configuration
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            timeout: config.timeout(),
            total_timeout: config.total_timeout(),
            config,
            extra_steps: Vec::new(),
        }
    }

    /// Load configuration from a file
    pub fn from_config_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        Ok(Self::new(DetectorConfig::from_file(path)?))
    }

    /// Load configuration from a JSON string
    pub fn from_config_str(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(DetectorConfig::from_json(json)?))
    }

    /// Set the maximum number of concurrent fetches
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a deadline for the whole batch
    pub fn with_total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = Some(timeout);
        self
    }

    /// Replace the built-in step list
    pub fn with_steps(mut self, steps: Vec<StepKind>) -> Self {
        self.config.steps = steps;
        self
    }

    /// Append a custom heuristic after the configured steps
    pub fn with_heuristic(mut self, step: Box<dyn Heuristic>) -> Self {
        self.extra_steps.push(step);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Validate the configuration and build a runner that fetches over HTTP
    pub fn build(self) -> Result<BatchRunner<HttpFetcher>, ConfigError> {
        let fetcher = HttpFetcher::with_timeout(&self.config, self.timeout)?;
        self.build_with_source(fetcher)
    }

    /// Validate the configuration and build a runner over any page source
    pub fn build_with_source<S: PageSource>(
        self,
        source: S,
    ) -> Result<BatchRunner<S>, ConfigError> {
        self.validate()?;
        let table = KeywordTable::from_config(&self.config)?;

        let mut chain = HeuristicChain::from_steps(&self.config.steps);
        for step in self.extra_steps {
            chain.push(step);
        }
        ::log::debug!("Heuristic chain: {:?}", chain.step_names());

        Ok(BatchRunner::new(
            source,
            table,
            chain,
            self.config.max_concurrency,
            self.timeout,
            self.total_timeout,
        ))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.config.validate() {
            // Custom heuristics alone are a valid chain
            Err(ConfigError::NoSteps) if !self.extra_steps.is_empty() => {}
            other => other?,
        }
        if self.timeout.is_zero() || self.total_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}
