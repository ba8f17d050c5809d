//! Product image extraction.
//!
//! Sources are tried in a fixed preference order: JSON-LD product images,
//! embedded catalog JSON, the recipe's configured selectors, known gallery
//! containers, `<noscript>` fallback markup, and the Open Graph image meta
//! tag as a last resort. The first source yielding anything wins.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use webcart_core::SelectorSpec;

use super::ElementExtractor;
use crate::variations::shopify;

/// Gallery scopes common across storefront themes, used when the recipe
/// configures no image selector that matches.
const GALLERY_SELECTORS: &[&str] = &[
    ".woocommerce-product-gallery img",
    ".product-gallery img",
    ".product__media img",
    "#product-images img",
    ".product-images img",
];

/// Filename fragments that identify non-product imagery.
const NOISE_FRAGMENTS: &[&str] = &["icon", "sprite", "logo", "placeholder", "favicon", "badge"];

/// Extracts product image URLs in source-preference order.
#[must_use]
pub fn extract_images(
    extractor: &ElementExtractor<'_>,
    primary: Option<&SelectorSpec>,
    fallback: Option<&SelectorSpec>,
) -> Vec<String> {
    let doc = extractor.document();

    let images = finalize(extractor, jsonld_images(doc));
    if !images.is_empty() {
        return images;
    }

    let images = finalize(extractor, shopify::embedded_product_images(doc));
    if !images.is_empty() {
        return images;
    }

    let images = finalize(extractor, configured_images(extractor, primary, fallback));
    if !images.is_empty() {
        return images;
    }

    let images = finalize(extractor, gallery_images(extractor));
    if !images.is_empty() {
        return images;
    }

    let images = finalize(extractor, noscript_images(doc));
    if !images.is_empty() {
        return images;
    }

    finalize(extractor, og_image(doc))
}

/// Resolves to absolute URLs, drops icon/sprite/logo noise, dedupes
/// preserving order.
fn finalize(extractor: &ElementExtractor<'_>, candidates: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter_map(|c| extractor.absolutize(&c))
        .filter(|url| !is_noise(url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn is_noise(url: &str) -> bool {
    let filename = url.rsplit('/').next().unwrap_or(url).to_lowercase();
    NOISE_FRAGMENTS.iter().any(|f| filename.contains(f))
}

/// schema.org JSON-LD `Product.image`: a string, an array of strings, or
/// `ImageObject`s with a `url` field.
fn jsonld_images(doc: &Html) -> Vec<String> {
    let script_sel =
        Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector");

    for script in doc.select(&script_sel) {
        let text = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        if let Some(product) = find_jsonld_product(&value) {
            let images = image_values(product.get("image"));
            if !images.is_empty() {
                return images;
            }
        }
    }
    Vec::new()
}

/// Locates a `@type: Product` node directly, inside a top-level array, or
/// inside an `@graph` array.
fn find_jsonld_product(value: &Value) -> Option<&Value> {
    let is_product = |v: &Value| -> bool {
        match v.get("@type") {
            Some(Value::String(t)) => t == "Product",
            Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
            _ => false,
        }
    };

    if is_product(value) {
        return Some(value);
    }
    if let Some(arr) = value.as_array() {
        return arr.iter().find(|v| is_product(v));
    }
    if let Some(graph) = value.get("@graph").and_then(Value::as_array) {
        return graph.iter().find(|v| is_product(v));
    }
    None
}

fn image_values(image: Option<&Value>) -> Vec<String> {
    match image {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => item
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        Some(Value::Object(_)) => image
            .and_then(|i| i.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn configured_images(
    extractor: &ElementExtractor<'_>,
    primary: Option<&SelectorSpec>,
    fallback: Option<&SelectorSpec>,
) -> Vec<String> {
    for spec in primary.into_iter().chain(fallback) {
        for selector in spec.iter().filter(|s| super::usable_selector(s)) {
            let Ok(parsed) = Selector::parse(selector) else {
                continue;
            };
            let urls: Vec<String> = extractor
                .document()
                .select(&parsed)
                .filter_map(element_image_candidate)
                .collect();
            if !urls.is_empty() {
                return urls;
            }
        }
    }
    Vec::new()
}

fn gallery_images(extractor: &ElementExtractor<'_>) -> Vec<String> {
    for selector in GALLERY_SELECTORS {
        let parsed = Selector::parse(selector).expect("valid selector");
        let urls: Vec<String> = extractor
            .document()
            .select(&parsed)
            .filter_map(element_image_candidate)
            .collect();
        if !urls.is_empty() {
            return urls;
        }
    }
    Vec::new()
}

/// `<noscript>` blocks often carry the non-lazy `<img>` markup.
fn noscript_images(doc: &Html) -> Vec<String> {
    let noscript_sel = Selector::parse("noscript").expect("valid selector");
    let img_sel = Selector::parse("img").expect("valid selector");

    let mut urls = Vec::new();
    for noscript in doc.select(&noscript_sel) {
        let inner = noscript.inner_html();
        let fragment = Html::parse_fragment(&inner);
        for img in fragment.select(&img_sel) {
            if let Some(url) = element_image_candidate(img) {
                urls.push(url);
            }
        }
    }
    urls
}

fn og_image(doc: &Html) -> Vec<String> {
    let meta_sel = Selector::parse(r#"meta[property="og:image"]"#).expect("valid selector");
    doc.select(&meta_sel)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::to_string)
        .take(1)
        .collect()
}

/// Best URL for one `<img>`-like element: the widest `srcset` candidate,
/// then `data-src` (lazy loading), then `src`.
fn element_image_candidate(el: ElementRef<'_>) -> Option<String> {
    let value = el.value();
    if let Some(srcset) = value.attr("srcset").or_else(|| value.attr("data-srcset")) {
        if let Some(widest) = widest_srcset_candidate(srcset) {
            return Some(widest);
        }
    }
    value
        .attr("data-src")
        .or_else(|| value.attr("src"))
        .map(str::to_string)
}

/// Picks the URL with the largest `w` descriptor from a `srcset` list;
/// falls back to the first entry when no width descriptors are present.
fn widest_srcset_candidate(srcset: &str) -> Option<String> {
    let mut best: Option<(u32, &str)> = None;
    let mut first: Option<&str> = None;

    for entry in srcset.split(',') {
        let mut parts = entry.split_whitespace();
        let Some(url) = parts.next() else { continue };
        first.get_or_insert(url);
        let width = parts
            .next()
            .and_then(|d| d.strip_suffix('w'))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(w) = width {
            if best.is_none_or(|(bw, _)| w > bw) {
                best = Some((w, url));
            }
        }
    }

    best.map(|(_, url)| url.to_string())
        .or_else(|| first.map(str::to_string))
}
