use crate::config::DetectorConfig;
use crate::error::{ConfigError, FetchError};
use reqwest::redirect::Policy;
use std::future::Future;
use std::time::{Duration, Instant};
use url::Url;

/// Body of a fetched page together with where it actually came from
#[derive(Debug, Clone)]
pub struct RawPage {
    /// URL the body was served from (differs from the request after redirects)
    pub final_url: Url,
    /// HTTP status code, kept for logging only
    pub status: u16,
    /// Response body, charset-decoded
    pub body: String,
}

/// Anything that can turn a URL into a page body
pub trait PageSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<RawPage, FetchError>> + Send;
}

/// Fetches pages with a single HTTP GET each
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build the HTTP client. Fails only if the TLS backend cannot be set up.
    pub fn new(config: &DetectorConfig) -> Result<Self, ConfigError> {
        Self::with_timeout(config, config.timeout())
    }

    /// Like [`HttpFetcher::new`] with a timeout overriding `timeout_secs`
    pub fn with_timeout(config: &DetectorConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let redirect = if config.follow_redirects {
            Policy::limited(config.max_redirects)
        } else {
            Policy::none()
        };

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(timeout)
            .redirect(redirect)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn transport_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(error_chain(&error.without_url()))
        }
    }
}

impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RawPage, FetchError> {
        let parsed = parse_url(url)?;
        let started = Instant::now();

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        // Non-2xx bodies are still classified; soft 404 pages often carry shop markup
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        ::log::debug!(
            "Fetched {} ({}, {} bytes) in {:.2} seconds",
            final_url,
            status,
            body.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(RawPage {
            final_url,
            status,
            body,
        })
    }
}

/// Flattens an error and its sources into one line, e.g.
/// `error sending request: tcp connect error: Connection refused`
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Parse a URL that is about to be requested. Only absolute http(s) URLs
/// can be fetched.
pub fn parse_url(url: &str) -> Result<Url, FetchError> {
    let trimmed = url.trim();
    let parsed =
        Url::parse(trimmed).map_err(|e| FetchError::InvalidUrl(format!("{trimmed}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(FetchError::UnsupportedScheme(other.to_string())),
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidUrl(format!("{trimmed}: missing host")));
    }
    Ok(parsed)
}
