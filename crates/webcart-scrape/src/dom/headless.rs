//! Headless Chromium page loader via chromiumoxide.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;

use super::PageLoader;
use crate::error::ScrapeError;

/// Total time allowed for the wait-for-selector poll after navigation.
const WAIT_FOR_DEADLINE: Duration = Duration::from_secs(10);
/// Poll interval while waiting for selectors to appear.
const WAIT_FOR_INTERVAL: Duration = Duration::from_millis(200);
/// Navigation timeout per page.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Find the Chromium binary path: explicit override first, then `PATH`.
fn find_chromium(configured: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "configured chromium path does not exist");
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    None
}

/// Headless browser loader. One browser instance serves all pages for a
/// site; each load opens and closes its own tab.
#[derive(Debug)]
pub struct ChromiumLoader {
    browser: Browser,
}

impl ChromiumLoader {
    /// Launches a headless Chromium instance.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Headless`] if no Chromium binary can be found
    /// or the browser fails to launch.
    pub async fn launch(configured_path: Option<PathBuf>) -> Result<Self, ScrapeError> {
        let chrome_path =
            find_chromium(configured_path).ok_or_else(|| ScrapeError::Headless {
                url: String::new(),
                reason: "no Chromium binary found".to_string(),
            })?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| ScrapeError::Headless {
                url: String::new(),
                reason: format!("failed to build browser config: {e}"),
            })?;

        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| ScrapeError::Headless {
                    url: String::new(),
                    reason: format!("failed to launch Chromium: {e}"),
                })?;

        // Drain CDP events for the lifetime of the browser.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }

    async fn render(&self, url: &str, wait_for: &[String]) -> Result<String, ScrapeError> {
        let headless_err = |reason: String| ScrapeError::Headless {
            url: url.to_owned(),
            reason,
        };

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| headless_err(format!("failed to open tab: {e}")))?;

        let navigation = tokio::time::timeout(NAVIGATION_TIMEOUT, page.goto(url)).await;
        match navigation {
            Ok(Ok(_)) => {
                let _ = page.wait_for_navigation().await;
            }
            Ok(Err(e)) => {
                let _ = page.close().await;
                return Err(headless_err(format!("navigation failed: {e}")));
            }
            Err(_) => {
                let _ = page.close().await;
                return Err(headless_err(format!(
                    "navigation timed out after {}s",
                    NAVIGATION_TIMEOUT.as_secs()
                )));
            }
        }

        // Poll for the requested selectors. Missing selectors are soft: the
        // extraction layer treats absent elements as misses, so we return
        // whatever rendered rather than failing the page.
        if !wait_for.is_empty() {
            let deadline = Instant::now() + WAIT_FOR_DEADLINE;
            loop {
                let mut all_found = true;
                for selector in wait_for {
                    if page.find_element(selector.as_str()).await.is_err() {
                        all_found = false;
                        break;
                    }
                }
                if all_found {
                    break;
                }
                if Instant::now() >= deadline {
                    tracing::debug!(url, ?wait_for, "selectors never appeared before deadline");
                    break;
                }
                tokio::time::sleep(WAIT_FOR_INTERVAL).await;
            }
        }

        let html = page
            .content()
            .await
            .map_err(|e| headless_err(format!("failed to read page content: {e}")));
        let _ = page.close().await;
        html
    }
}

#[async_trait]
impl PageLoader for ChromiumLoader {
    async fn load(&self, url: &str, wait_for: &[String]) -> Result<String, ScrapeError> {
        self.render(url, wait_for).await
    }
}
