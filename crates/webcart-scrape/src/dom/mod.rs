//! DOM acquisition strategies.
//!
//! Two backing loaders: a static fetch-and-parse path (fast, no JavaScript)
//! and a headless Chromium path (executes JavaScript, waits for selectors).
//! The headless path is used only when the recipe asks for it; on failure it
//! falls back exactly once to the static path. The static path never
//! escalates to headless.

pub mod headless;
pub mod static_loader;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ScrapeError;
use headless::ChromiumLoader;
use static_loader::StaticLoader;

/// Fetches a page and returns its HTML.
///
/// `wait_for` lists CSS selectors the loader should wait on before
/// returning; loaders without JavaScript support ignore it.
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str, wait_for: &[String]) -> Result<String, ScrapeError>;
}

/// Strategy selector bound to one site's recipe.
///
/// The Chromium loader is launched lazily on first use so that building an
/// adapter never requires a browser binary.
#[derive(Debug)]
pub struct DomStrategy {
    static_loader: StaticLoader,
    headless: Option<Arc<tokio::sync::OnceCell<Arc<ChromiumLoader>>>>,
    chromium_path: Option<std::path::PathBuf>,
}

impl DomStrategy {
    /// Builds a strategy for one site. `use_headless` is the recipe flag
    /// already intersected with the global headless kill switch.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        use_headless: bool,
        chromium_path: Option<std::path::PathBuf>,
    ) -> Result<Self, ScrapeError> {
        let static_loader = StaticLoader::new(timeout_secs, user_agent)?;
        let headless = use_headless.then(|| Arc::new(tokio::sync::OnceCell::new()));
        Ok(Self {
            static_loader,
            headless,
            chromium_path,
        })
    }

    /// Loads a page, choosing between the headless and static paths.
    ///
    /// # Errors
    ///
    /// Returns a retryable load error when every applicable strategy fails.
    /// Failure is scoped to this URL only; callers iterate on.
    pub async fn load(&self, url: &str, wait_for: &[String]) -> Result<String, ScrapeError> {
        if let Some(cell) = &self.headless {
            match self.load_headless(cell, url, wait_for).await {
                Ok(html) => return Ok(html),
                Err(err) => {
                    tracing::warn!(
                        url,
                        error = %err,
                        "headless load failed, falling back to static fetch"
                    );
                }
            }
        }

        self.static_loader.load(url, wait_for).await
    }

    async fn load_headless(
        &self,
        cell: &tokio::sync::OnceCell<Arc<ChromiumLoader>>,
        url: &str,
        wait_for: &[String],
    ) -> Result<String, ScrapeError> {
        let loader = cell
            .get_or_try_init(|| async {
                ChromiumLoader::launch(self.chromium_path.clone())
                    .await
                    .map(Arc::new)
            })
            .await?;
        loader.load(url, wait_for).await
    }
}
