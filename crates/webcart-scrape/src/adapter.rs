//! Site adapter: one compiled extraction pipeline per (recipe, site) pair.
//!
//! The adapter owns the DOM strategy and walks the pipeline for each
//! product URL: load, extract, synthesize variations, normalize,
//! validate. It is immutable after construction and safe to share across
//! tasks.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Url;
use scraper::Html;
use webcart_core::{AppConfig, RawProduct, Recipe, SelectorSet, SelectorSpec, ValidationError};

use crate::dom::DomStrategy;
use crate::error::ScrapeError;
use crate::extract::{attributes, images, stock, ElementExtractor};
use crate::retry::retry_with_backoff;
use crate::transform::normalize_product;
use crate::validate::validate_product;
use crate::variations::synthesize_variations;

/// One pipeline result: the normalized product plus whatever violations
/// the validator collected. Violations never block encoding; the caller
/// decides what to do with them.
#[derive(Debug, Clone)]
pub struct ExtractedProduct {
    pub product: webcart_core::NormalizedProduct,
    pub violations: Vec<ValidationError>,
}

#[derive(Debug)]
pub struct SiteAdapter {
    recipe: Arc<Recipe>,
    site_url: String,
    dom: DomStrategy,
    fetch_retries: u32,
    backoff_base_secs: u64,
    delay_ms: u64,
    max_pages: usize,
    max_concurrent: usize,
}

impl SiteAdapter {
    /// Builds an adapter binding `recipe` to `site_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::RecipeSiteMismatch`] when the recipe's site
    /// pattern does not cover `site_url`, or an HTTP-client construction
    /// error.
    pub fn new(site_url: &str, recipe: Arc<Recipe>, config: &AppConfig) -> Result<Self, ScrapeError> {
        if !recipe.matches_site(site_url) {
            return Err(ScrapeError::RecipeSiteMismatch {
                name: recipe.name.clone(),
                site_url: site_url.to_string(),
            });
        }

        let use_headless = recipe.behavior.use_headless_browser && config.headless_enabled;
        let dom = DomStrategy::new(
            config.request_timeout_secs,
            &config.user_agent,
            use_headless,
            config.chromium_path.clone(),
        )?;

        Ok(Self {
            delay_ms: recipe.behavior.rate_limit_ms.unwrap_or(config.inter_request_delay_ms),
            fetch_retries: recipe.behavior.max_retries.unwrap_or(config.max_retries),
            recipe,
            site_url: site_url.to_string(),
            dom,
            backoff_base_secs: config.retry_backoff_base_secs,
            max_pages: config.max_pages,
            max_concurrent: config.max_concurrent_products.max(1),
        })
    }

    #[must_use]
    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Walks listing pages sequentially, collecting product URLs until the
    /// next-page link runs out or the page cap is reached. A failing
    /// listing page ends discovery with whatever was collected so far.
    ///
    /// # Errors
    ///
    /// Returns an error only when the first listing page cannot be loaded.
    pub async fn discover_product_urls(&self) -> Result<Vec<String>, ScrapeError> {
        let mut urls: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut current = self.site_url.clone();
        let mut page = 0usize;

        loop {
            if page >= self.max_pages {
                tracing::warn!(
                    site_url = %self.site_url,
                    max_pages = self.max_pages,
                    "pagination cap reached, stopping discovery"
                );
                break;
            }

            let html = if page == 0 {
                self.fetch_page(&current).await?
            } else {
                match self.fetch_page(&current).await {
                    Ok(html) => html,
                    Err(err) => {
                        tracing::warn!(url = %current, error = %err, "listing page failed, stopping discovery");
                        break;
                    }
                }
            };

            let next = {
                let base = page_url(&current)?;
                let doc = Html::parse_document(&html);
                let extractor = ElementExtractor::new(&doc, &base);

                let links = extractor.extract_links(
                    self.recipe.selectors.product_links.as_ref(),
                    self.recipe.fallbacks.as_ref().and_then(|f| f.product_links.as_ref()),
                );
                for link in links {
                    if seen.insert(link.clone()) {
                        urls.push(link);
                    }
                }

                extractor.first_link(self.recipe.selectors.next_page.as_ref())
            };

            match next {
                Some(next_url) if next_url != current => current = next_url,
                _ => break,
            }
            page += 1;

            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
        }

        if self.recipe.behavior.fast_mode {
            if let Some(cap) = self.recipe.behavior.max_products {
                urls.truncate(cap);
            }
        }

        tracing::info!(site_url = %self.site_url, count = urls.len(), "product URLs discovered");
        Ok(urls)
    }

    /// Runs the full pipeline for one product URL.
    ///
    /// # Errors
    ///
    /// Returns a load error when the page cannot be fetched by any
    /// strategy; extraction misses inside a loaded page are never errors.
    pub async fn extract_product(&self, url: &str) -> Result<ExtractedProduct, ScrapeError> {
        let html = self.fetch_page(url).await?;
        // The parsed document is not Send; all DOM work stays inside this
        // synchronous scope.
        let base = page_url(url)?;
        let doc = Html::parse_document(&html);
        let extractor = ElementExtractor::new(&doc, &base);

        let raw = self.extract_raw(&extractor, url);
        let product = normalize_product(&raw, &self.recipe);
        let violations = validate_product(&product, &self.recipe);

        tracing::debug!(
            url,
            title = %product.title,
            variations = product.variations.len(),
            violations = violations.len(),
            "product extracted"
        );
        Ok(ExtractedProduct { product, violations })
    }

    /// Discovers product URLs, then extracts each one. A failing product
    /// page is logged and skipped; it never aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns an error only when discovery itself fails on the first page.
    pub async fn run(&self) -> Result<Vec<ExtractedProduct>, ScrapeError> {
        let urls = self.discover_product_urls().await?;

        let results: Vec<Option<ExtractedProduct>> = stream::iter(urls)
            .map(|url| async move {
                match self.extract_product(&url).await {
                    Ok(extracted) => Some(extracted),
                    Err(err) => {
                        tracing::warn!(url = %url, error = %err, "product page failed, skipping");
                        None
                    }
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        Ok(results.into_iter().flatten().collect())
    }

    fn extract_raw(&self, extractor: &ElementExtractor<'_>, url: &str) -> RawProduct {
        let selectors = &self.recipe.selectors;
        let fallbacks = self.recipe.fallbacks.as_ref();
        let pick = |f: fn(&SelectorSet) -> Option<&SelectorSpec>| {
            (f(selectors), fallbacks.and_then(f))
        };

        let (title_p, title_f) = pick(|s| s.title.as_ref());
        let (price_p, price_f) = pick(|s| s.price.as_ref());
        let (desc_p, desc_f) = pick(|s| s.description.as_ref());
        let (sku_p, sku_f) = pick(|s| s.sku.as_ref());
        let (cat_p, cat_f) = pick(|s| s.category.as_ref());
        let (img_p, img_f) = pick(|s| s.images.as_ref());
        let (stock_p, stock_f) = pick(|s| s.stock.as_ref());
        let (attr_p, attr_f) = pick(|s| s.attributes.as_ref());

        let mut raw = RawProduct {
            source_url: url.to_string(),
            title: extractor.extract_text(title_p, title_f),
            slug: None,
            description: extractor.extract_description(desc_p, desc_f),
            sku: extractor.extract_text(sku_p, sku_f),
            stock_text: Some(stock::extract_stock_status(
                extractor,
                stock_p,
                stock_f,
                &self.recipe.stock_phrases,
            )),
            images: images::extract_images(extractor, img_p, img_f),
            category: extractor.extract_text(cat_p, cat_f),
            attributes: attributes::extract_attributes(extractor, attr_p, attr_f),
            variations: Vec::new(),
            price_text: extractor.extract_price(price_p, price_f),
        };
        raw.variations =
            synthesize_variations(extractor, selectors.variations.as_ref(), &raw);
        raw
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let wait_for = self.wait_selectors();
        retry_with_backoff(self.fetch_retries, self.backoff_base_secs, || {
            self.dom.load(url, &wait_for)
        })
        .await
    }

    /// Selectors the headless loader should wait on: the first title and
    /// price selectors, when configured.
    fn wait_selectors(&self) -> Vec<String> {
        [&self.recipe.selectors.title, &self.recipe.selectors.price]
            .into_iter()
            .filter_map(|spec| spec.as_ref())
            .filter_map(|spec| spec.iter().next())
            .map(str::to_string)
            .collect()
    }
}

fn page_url(url: &str) -> Result<Url, ScrapeError> {
    Url::parse(url).map_err(|e| ScrapeError::PageLoad {
        url: url.to_string(),
        reason: format!("invalid URL: {e}"),
    })
}
