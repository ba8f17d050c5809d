//! Declarative variation-form JSON.
//!
//! WooCommerce-style themes attach the full variation list to the
//! variation form as a `data-product_variations` attribute: a JSON array
//! of variation records, frequently with entity-escaped quotes. Attribute
//! keys carry the `attribute_` form-field prefix, which is stripped to
//! recover display names.

use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use webcart_core::{RawVariation, SelectorSpec};

use crate::extract::attributes::attribute_name_from_field;

#[derive(Debug, Deserialize)]
struct FormVariation {
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    variation_id: Option<u64>,
    #[serde(default)]
    display_regular_price: Option<Value>,
    #[serde(default)]
    display_price: Option<Value>,
    #[serde(default)]
    is_in_stock: Option<bool>,
    #[serde(default)]
    image: Option<FormImage>,
    /// `attribute_pa_color` → chosen value. BTreeMap keeps key order
    /// deterministic.
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FormImage {
    #[serde(default)]
    src: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    full_src: Option<String>,
}

impl FormImage {
    fn best_url(&self) -> Option<&str> {
        self.full_src
            .as_deref()
            .or(self.src.as_deref())
            .or(self.url.as_deref())
    }
}

/// Extracts variations from a `data-product_variations` form attribute.
/// The recipe's variation selector is tried first as the form scope, then
/// any element carrying the attribute. Empty when no parseable payload is
/// found.
#[must_use]
pub fn form_variations(doc: &Html, spec: Option<&SelectorSpec>) -> Vec<RawVariation> {
    for payload in payload_candidates(doc, spec) {
        let cleaned = clean_entities(&payload);
        match serde_json::from_str::<Vec<FormVariation>>(&cleaned) {
            Ok(entries) if !entries.is_empty() => {
                return entries.iter().map(to_raw_variation).collect();
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(error = %err, "variation-form payload parse failed");
            }
        }
    }
    Vec::new()
}

fn payload_candidates(doc: &Html, spec: Option<&SelectorSpec>) -> Vec<String> {
    let mut payloads = Vec::new();

    if let Some(spec) = spec {
        for selector in spec.iter() {
            let Ok(parsed) = Selector::parse(selector) else {
                continue;
            };
            payloads.extend(
                doc.select(&parsed)
                    .filter_map(|el| el.value().attr("data-product_variations"))
                    .map(str::to_string),
            );
        }
    }

    let attr_sel = Selector::parse("[data-product_variations]").expect("valid selector");
    payloads.extend(
        doc.select(&attr_sel)
            .filter_map(|el| el.value().attr("data-product_variations"))
            .map(str::to_string),
    );

    payloads
}

/// Entity-escaped quotes survive in some theme output even after the HTML
/// parser's own decoding pass.
fn clean_entities(payload: &str) -> String {
    payload.replace("&quot;", "\"").replace("&amp;", "&")
}

fn to_raw_variation(entry: &FormVariation) -> RawVariation {
    let regular = entry
        .display_regular_price
        .as_ref()
        .and_then(render_price)
        .unwrap_or_default();
    let display = entry
        .display_price
        .as_ref()
        .and_then(render_price)
        .unwrap_or_default();
    let sale = if !display.is_empty() && display != regular {
        display.clone()
    } else {
        String::new()
    };
    let regular = if regular.is_empty() { display } else { regular };

    RawVariation {
        sku: entry
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| entry.variation_id.map(|id| id.to_string()))
            .unwrap_or_default(),
        regular_price: regular,
        sale_price: sale,
        tax_class: String::new(),
        stock_text: match entry.is_in_stock {
            Some(true) => "instock".to_string(),
            Some(false) => "outofstock".to_string(),
            None => String::new(),
        },
        images: entry
            .image
            .as_ref()
            .and_then(FormImage::best_url)
            .map(str::to_string)
            .into_iter()
            .collect(),
        attributes: entry
            .attributes
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(field, value)| (attribute_name_from_field(field), value.trim().to_string()))
            .collect(),
    }
}

/// Prices in form payloads arrive as JSON numbers or strings.
fn render_price(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_attribute_yields_variations() {
        let html = r#"
            <form class="variations_form" data-product_variations='[
                {"sku": "TEE-R", "display_regular_price": 24.99, "display_price": 19.99,
                 "is_in_stock": true,
                 "image": {"src": "https://shop.example.com/img/tee-red.jpg"},
                 "attributes": {"attribute_pa_color": "red"}},
                {"sku": "TEE-B", "display_regular_price": 24.99, "display_price": 24.99,
                 "is_in_stock": false,
                 "attributes": {"attribute_pa_color": "blue"}}
            ]'></form>
        "#;
        let doc = Html::parse_document(html);
        let variations = form_variations(&doc, None);
        assert_eq!(variations.len(), 2);

        assert_eq!(variations[0].sku, "TEE-R");
        assert_eq!(variations[0].regular_price, "24.99");
        assert_eq!(variations[0].sale_price, "19.99");
        assert_eq!(variations[0].stock_text, "instock");
        assert_eq!(
            variations[0].images,
            vec!["https://shop.example.com/img/tee-red.jpg"]
        );
        assert_eq!(
            variations[0].attributes,
            vec![("Color".to_string(), "red".to_string())]
        );

        assert_eq!(variations[1].sale_price, "");
        assert_eq!(variations[1].stock_text, "outofstock");
    }

    #[test]
    fn entity_escaped_payload_is_cleaned_before_parsing() {
        let html = r#"
            <form data-product_variations="[{&quot;sku&quot;: &quot;X-1&quot;, &quot;display_price&quot;: &quot;9.99&quot;, &quot;is_in_stock&quot;: true, &quot;attributes&quot;: {&quot;attribute_size&quot;: &quot;M&quot;}}]"></form>
        "#;
        let doc = Html::parse_document(html);
        let variations = form_variations(&doc, None);
        assert_eq!(variations.len(), 1);
        assert_eq!(variations[0].sku, "X-1");
        assert_eq!(variations[0].regular_price, "9.99");
        assert_eq!(
            variations[0].attributes,
            vec![("Size".to_string(), "M".to_string())]
        );
    }

    #[test]
    fn missing_sku_falls_back_to_variation_id() {
        let html = r#"
            <form data-product_variations='[
                {"variation_id": 4711, "display_price": "5.00", "attributes": {}}
            ]'></form>
        "#;
        let doc = Html::parse_document(html);
        let variations = form_variations(&doc, None);
        assert_eq!(variations[0].sku, "4711");
    }

    #[test]
    fn configured_selector_scope_is_tried_first() {
        let html = r#"
            <form id="main" data-product_variations='[{"sku": "GOOD", "display_price": "1.00", "attributes": {}}]'></form>
        "#;
        let doc = Html::parse_document(html);
        let spec = SelectorSpec::One("#main".to_string());
        let variations = form_variations(&doc, Some(&spec));
        assert_eq!(variations[0].sku, "GOOD");
    }

    #[test]
    fn malformed_payload_yields_empty() {
        let html = r#"<form data-product_variations='[{"sku": broken'></form>"#;
        let doc = Html::parse_document(html);
        assert!(form_variations(&doc, None).is_empty());
    }

    #[test]
    fn no_form_yields_empty() {
        let doc = Html::parse_document("<p>nothing</p>");
        assert!(form_variations(&doc, None).is_empty());
    }
}
