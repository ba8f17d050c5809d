//! Static fetch-and-parse page loader.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::PageLoader;
use crate::error::ScrapeError;

/// HTTP page loader without JavaScript execution.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx
/// responses as typed errors so callers can distinguish retryable
/// conditions from deterministic ones.
#[derive(Debug)]
pub struct StaticLoader {
    client: Client,
}

impl StaticLoader {
    /// Creates a loader with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScrapeError::RateLimited {
                domain: extract_domain(url),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScrapeError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageLoader for StaticLoader {
    /// `wait_for` is ignored: without JavaScript execution the document is
    /// complete as served.
    async fn load(&self, url: &str, _wait_for: &[String]) -> Result<String, ScrapeError> {
        self.fetch(url).await
    }
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
fn extract_domain(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(url)
        .to_owned()
}
