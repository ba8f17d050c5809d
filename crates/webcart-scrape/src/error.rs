use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("headless browser failure for {url}: {reason}")]
    Headless { url: String, reason: String },

    #[error("failed to load {url}: {reason}")]
    PageLoad { url: String, reason: String },

    #[error("no recipe named \"{name}\" in {dir}")]
    UnknownRecipe { name: String, dir: String },

    #[error("recipe \"{name}\" does not match site {site_url}")]
    RecipeSiteMismatch { name: String, site_url: String },

    #[error(transparent)]
    Config(#[from] webcart_core::ConfigError),
}

impl ScrapeError {
    /// Returns `true` if the error represents a transient network or
    /// browser condition the caller may retry or skip. Everything else
    /// (missing pages, unknown recipes, config problems) is deterministic
    /// and retrying would return the same result.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScrapeError::Http(_)
                | ScrapeError::RateLimited { .. }
                | ScrapeError::Headless { .. }
                | ScrapeError::PageLoad { .. }
        )
    }
}
