//! Element extraction service.
//!
//! Given a parsed document and a selector (or ordered list of fallback
//! selectors), extracts text, links, images, prices, stock text, and
//! attribute groups. Selectors are tried strictly in order and the first
//! non-empty result wins; partial results are never merged across
//! selectors.

pub mod attributes;
mod cache;
pub mod images;
pub mod stock;

use std::cell::RefCell;

use reqwest::Url;
use scraper::{Html, Selector};
use webcart_core::SelectorSpec;

use cache::ElementCache;
pub(crate) use webcart_core::recipe::usable_selector;

/// Minimum fragment length kept when joining multi-paragraph descriptions.
/// Shorter fragments are boilerplate ("Share", "Size guide").
const MIN_PARAGRAPH_CHARS: usize = 10;

/// Extraction surface bound to one parsed page.
///
/// Holds the per-page element cache; create one per page and drop it with
/// the document. The document is immutable, so a query runs exactly once:
/// retries belong to the page-load layer, where a second attempt can
/// actually change what is there to select.
pub struct ElementExtractor<'a> {
    doc: &'a Html,
    base_url: &'a Url,
    cache: RefCell<ElementCache>,
}

impl<'a> ElementExtractor<'a> {
    #[must_use]
    pub fn new(doc: &'a Html, base_url: &'a Url) -> Self {
        Self {
            doc,
            base_url,
            cache: RefCell::new(ElementCache::new()),
        }
    }

    /// First non-empty text produced by the primary spec, then the fallback
    /// spec. `None` when every selector misses — extraction misses are
    /// silent.
    #[must_use]
    pub fn extract_text(
        &self,
        primary: Option<&SelectorSpec>,
        fallback: Option<&SelectorSpec>,
    ) -> Option<String> {
        self.cascade_texts(primary, fallback).into_iter().next()
    }

    /// Raw price text; cleaning happens in the transformer.
    #[must_use]
    pub fn extract_price(
        &self,
        primary: Option<&SelectorSpec>,
        fallback: Option<&SelectorSpec>,
    ) -> Option<String> {
        self.extract_text(primary, fallback)
    }

    /// Description text. When the matched element contains several
    /// paragraph children, their individual texts are joined with a blank
    /// line, dropping fragments under [`MIN_PARAGRAPH_CHARS`].
    #[must_use]
    pub fn extract_description(
        &self,
        primary: Option<&SelectorSpec>,
        fallback: Option<&SelectorSpec>,
    ) -> Option<String> {
        for selector in self.selector_cascade(primary, fallback) {
            let Some(parsed) = self.parse_selector(&selector) else {
                continue;
            };
            let Some(element) = self.doc.select(&parsed).next() else {
                continue;
            };

            let paragraph_sel = Selector::parse("p").expect("valid selector");
            let paragraphs: Vec<String> = element
                .select(&paragraph_sel)
                .map(|p| collapse_whitespace(&p.text().collect::<String>()))
                .filter(|t| t.chars().count() >= MIN_PARAGRAPH_CHARS)
                .collect();

            let text = if paragraphs.len() > 1 {
                paragraphs.join("\n\n")
            } else {
                collapse_whitespace(&element.text().collect::<String>())
            };
            if !text.is_empty() {
                return Some(text);
            }
        }
        None
    }

    /// All `href` targets matched by the cascade, resolved to absolute URLs
    /// and deduplicated preserving order.
    #[must_use]
    pub fn extract_links(
        &self,
        primary: Option<&SelectorSpec>,
        fallback: Option<&SelectorSpec>,
    ) -> Vec<String> {
        for selector in self.selector_cascade(primary, fallback) {
            let Some(parsed) = self.parse_selector(&selector) else {
                continue;
            };
            let mut seen = std::collections::HashSet::new();
            let links: Vec<String> = self
                .doc
                .select(&parsed)
                .filter_map(|el| el.value().attr("href"))
                .filter_map(|href| self.absolutize(href))
                .filter(|url| seen.insert(url.clone()))
                .collect();
            if !links.is_empty() {
                return links;
            }
        }
        Vec::new()
    }

    /// First link matched by the cascade; used for pagination next-links.
    #[must_use]
    pub fn first_link(&self, spec: Option<&SelectorSpec>) -> Option<String> {
        self.extract_links(spec, None).into_iter().next()
    }

    /// Resolves a possibly relative `href`/`src` against the page URL.
    #[must_use]
    pub fn absolutize(&self, href: &str) -> Option<String> {
        let trimmed = href.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.base_url.join(trimmed).ok().map(|u| u.to_string())
    }

    #[must_use]
    pub(crate) fn base_url(&self) -> &Url {
        self.base_url
    }

    #[must_use]
    pub(crate) fn document(&self) -> &Html {
        self.doc
    }

    /// Texts produced by the first selector in the cascade that matches
    /// anything non-empty. Results are cached per selector for the life of
    /// this extractor.
    pub(crate) fn cascade_texts(
        &self,
        primary: Option<&SelectorSpec>,
        fallback: Option<&SelectorSpec>,
    ) -> Vec<String> {
        for selector in self.selector_cascade(primary, fallback) {
            let texts = self.query_texts(&selector);
            if !texts.is_empty() {
                return texts;
            }
        }
        Vec::new()
    }

    /// Ordered, pre-filtered selector list: the primary spec first, then
    /// the fallback spec. The fallback is consulted only because the caller
    /// observed the primary missing; this method just flattens order.
    fn selector_cascade(
        &self,
        primary: Option<&SelectorSpec>,
        fallback: Option<&SelectorSpec>,
    ) -> Vec<String> {
        primary
            .into_iter()
            .chain(fallback)
            .flat_map(SelectorSpec::iter)
            .filter(|s| usable_selector(s))
            .map(str::to_string)
            .collect()
    }

    /// Runs one selector against the document, caching the result. Misses
    /// are deterministic and returned immediately.
    pub(crate) fn query_texts(&self, selector: &str) -> Vec<String> {
        if let Some(hit) = self.cache.borrow().get(selector) {
            return hit;
        }

        let Some(parsed) = self.parse_selector(selector) else {
            return Vec::new();
        };

        let texts: Vec<String> = self
            .doc
            .select(&parsed)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect();

        self.cache.borrow_mut().put(selector, texts.clone());
        texts
    }

    fn parse_selector(&self, selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::debug!(selector, error = %err, "skipping unparsable selector");
                None
            }
        }
    }

    /// Clears the per-page element cache.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}

/// Trims and collapses internal whitespace runs to single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
