//! Embedded catalog JSON variants.
//!
//! Storefront themes embed the product record as JSON in a `<script>`
//! block. Two shapes occur in the wild: a cents-denominated variant array
//! carrying option titles per variant, and an options/variants pair where
//! each variant holds positional `option1`..`option3` values. The shape is
//! resolved by an explicit probe before deserializing; a script that fails
//! either parse is skipped and the next script is tried.

use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use webcart_core::RawVariation;

/// Embedded product payload, discriminated by probing the first variant.
enum EmbeddedCatalog {
    Cents(CentsProduct),
    Positional(PositionalProduct),
}

#[derive(Debug, Deserialize)]
struct CentsProduct {
    variants: Vec<CentsVariant>,
    /// Option group names, positionally matching each variant's `options`.
    #[serde(default)]
    options: Vec<OptionEntry>,
    #[serde(default)]
    images: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct CentsVariant {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    sku: Option<String>,
    /// Price in minor units (cents).
    price: u64,
    /// Pre-discount price in minor units; present when the variant is on
    /// sale.
    #[serde(default)]
    compare_at_price: Option<u64>,
    #[serde(default)]
    available: Option<bool>,
    #[serde(default)]
    featured_image: Option<ImageEntry>,
    #[serde(default)]
    options: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PositionalProduct {
    #[serde(default)]
    options: Vec<OptionEntry>,
    variants: Vec<PositionalVariant>,
    #[serde(default)]
    images: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct PositionalVariant {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    compare_at_price: Option<Value>,
    #[serde(default)]
    available: Option<bool>,
    #[serde(default)]
    featured_image: Option<ImageEntry>,
    #[serde(default)]
    option1: Option<String>,
    #[serde(default)]
    option2: Option<String>,
    #[serde(default)]
    option3: Option<String>,
}

/// An option group name: either a bare string or an object with a `name`
/// field (and possibly a value list).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionEntry {
    Name(String),
    Group { name: String },
}

impl OptionEntry {
    fn name(&self) -> &str {
        match self {
            OptionEntry::Name(n) | OptionEntry::Group { name: n } => n,
        }
    }
}

/// An image reference: either a bare URL string or an object carrying
/// `src`/`url`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageEntry {
    Url(String),
    Object {
        #[serde(default)]
        src: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
}

impl ImageEntry {
    fn url(&self) -> Option<&str> {
        match self {
            ImageEntry::Url(u) => Some(u),
            ImageEntry::Object { src, url } => src.as_deref().or(url.as_deref()),
        }
    }
}

/// Extracts variations from embedded catalog JSON, or an empty list when
/// no script on the page carries a parseable product payload.
#[must_use]
pub fn embedded_variations(doc: &Html) -> Vec<RawVariation> {
    match find_catalog(doc) {
        Some(EmbeddedCatalog::Cents(product)) => cents_variations(doc, &product),
        Some(EmbeddedCatalog::Positional(product)) => positional_variations(doc, &product),
        None => Vec::new(),
    }
}

/// Image URLs from the embedded product payload: the product image list
/// plus each variant's featured image.
#[must_use]
pub fn embedded_product_images(doc: &Html) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    match find_catalog(doc) {
        Some(EmbeddedCatalog::Cents(product)) => {
            urls.extend(product.images.iter().filter_map(|i| i.url()).map(str::to_string));
            urls.extend(
                product
                    .variants
                    .iter()
                    .filter_map(|v| v.featured_image.as_ref())
                    .filter_map(ImageEntry::url)
                    .map(str::to_string),
            );
        }
        Some(EmbeddedCatalog::Positional(product)) => {
            urls.extend(product.images.iter().filter_map(|i| i.url()).map(str::to_string));
            urls.extend(
                product
                    .variants
                    .iter()
                    .filter_map(|v| v.featured_image.as_ref())
                    .filter_map(ImageEntry::url)
                    .map(str::to_string),
            );
        }
        None => {}
    }
    urls
}

/// Scans every `<script>` for a JSON object with a `variants` array and
/// probes its shape. Malformed JSON is skipped per script.
fn find_catalog(doc: &Html) -> Option<EmbeddedCatalog> {
    let script_sel = Selector::parse("script").expect("valid selector");
    for script in doc.select(&script_sel) {
        let text = script.text().collect::<String>();
        if !text.contains("variants") {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(text.trim()) else {
            continue;
        };
        if let Some(catalog) = probe(&value) {
            return Some(catalog);
        }
    }
    None
}

/// Shape discrimination: an integer `price` on the first variant marks the
/// cents shape; positional `option1` marks the options/variants shape.
fn probe(value: &Value) -> Option<EmbeddedCatalog> {
    let variants = value.get("variants")?.as_array()?;
    let first = variants.first()?;

    if first.get("price").is_some_and(Value::is_u64) {
        return serde_json::from_value::<CentsProduct>(value.clone())
            .map_err(|err| tracing::debug!(error = %err, "cents-shape parse failed"))
            .ok()
            .map(EmbeddedCatalog::Cents);
    }
    if first.get("option1").is_some() {
        return serde_json::from_value::<PositionalProduct>(value.clone())
            .map_err(|err| tracing::debug!(error = %err, "positional-shape parse failed"))
            .ok()
            .map(EmbeddedCatalog::Positional);
    }
    None
}

fn cents_variations(doc: &Html, product: &CentsProduct) -> Vec<RawVariation> {
    let option_names: Vec<String> = product.options.iter().map(|o| o.name().to_string()).collect();

    product
        .variants
        .iter()
        .enumerate()
        .map(|(index, variant)| {
            let (regular, sale) = match variant.compare_at_price {
                Some(compare) if compare > variant.price => {
                    (format_cents(compare), format_cents(variant.price))
                }
                _ => (format_cents(variant.price), String::new()),
            };

            RawVariation {
                sku: best_sku(variant.sku.as_deref(), variant.id, index, doc),
                regular_price: regular,
                sale_price: sale,
                tax_class: String::new(),
                stock_text: availability(variant.available),
                images: variant
                    .featured_image
                    .as_ref()
                    .and_then(ImageEntry::url)
                    .map(str::to_string)
                    .into_iter()
                    .collect(),
                attributes: zip_options(&option_names, &variant.options),
            }
        })
        .collect()
}

fn positional_variations(doc: &Html, product: &PositionalProduct) -> Vec<RawVariation> {
    let option_names: Vec<String> = product.options.iter().map(|o| o.name().to_string()).collect();

    product
        .variants
        .iter()
        .enumerate()
        .map(|(index, variant)| {
            let values: Vec<String> = [&variant.option1, &variant.option2, &variant.option3]
                .into_iter()
                .filter_map(|o| o.clone())
                .collect();

            RawVariation {
                sku: best_sku(variant.sku.as_deref(), variant.id, index, doc),
                regular_price: variant
                    .compare_at_price
                    .as_ref()
                    .and_then(render_price)
                    .or_else(|| variant.price.as_ref().and_then(render_price))
                    .unwrap_or_default(),
                sale_price: match (&variant.compare_at_price, &variant.price) {
                    (Some(compare), Some(price)) if render_price(compare) != render_price(price) => {
                        render_price(price).unwrap_or_default()
                    }
                    _ => String::new(),
                },
                tax_class: String::new(),
                stock_text: availability(variant.available),
                images: variant
                    .featured_image
                    .as_ref()
                    .and_then(ImageEntry::url)
                    .map(str::to_string)
                    .into_iter()
                    .collect(),
                attributes: zip_options(&option_names, &values),
            }
        })
        .collect()
}

/// Best-effort SKU: the explicit field, else a variant-id query parameter
/// referenced by an anchor on the page, else a generic placeholder.
fn best_sku(explicit: Option<&str>, id: Option<u64>, index: usize, doc: &Html) -> String {
    if let Some(sku) = explicit {
        let trimmed = sku.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    if let Some(id) = id {
        if anchor_references_variant(doc, id) {
            return id.to_string();
        }
    }
    format!("VAR-{}", index + 1)
}

fn anchor_references_variant(doc: &Html, id: u64) -> bool {
    let anchor_sel = Selector::parse(r#"a[href*="variant="]"#).expect("valid selector");
    let needle = format!("variant={id}");
    doc.select(&anchor_sel)
        .filter_map(|a| a.value().attr("href"))
        .any(|href| href.contains(&needle))
}

/// Pairs option group names with a variant's positional values. Groups
/// without a configured name get a generic one.
fn zip_options(names: &[String], values: &[String]) -> Vec<(String, String)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(i, value)| {
            let name = names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Option {}", i + 1));
            (name, value.trim().to_string())
        })
        .collect()
}

fn availability(available: Option<bool>) -> String {
    match available {
        Some(true) => "instock".to_string(),
        Some(false) => "outofstock".to_string(),
        None => String::new(),
    }
}

/// Minor units to a plain decimal string: 1999 → "19.99".
fn format_cents(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// A price that may arrive as a JSON string or number.
fn render_price(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
