//! Variation synthesis.
//!
//! Produces the minimal correct variation list for a product page, trying
//! sources in priority order: embedded catalog JSON, the declarative
//! variation-form payload, then DOM-driven synthesis from attribute
//! pickers. The first source yielding anything wins; results from any
//! source are deduplicated by SKU, first occurrence kept.

pub mod dom;
pub mod shopify;
pub mod woo;

use webcart_core::{RawProduct, RawVariation, SelectorSpec};

use crate::extract::{attributes, ElementExtractor};
use dom::SynthesisBase;

/// Synthesizes the variation list for one product page. `base` supplies
/// the already-extracted SKU, price, and stock used by DOM synthesis.
#[must_use]
pub fn synthesize_variations(
    extractor: &ElementExtractor<'_>,
    variation_spec: Option<&SelectorSpec>,
    base: &RawProduct,
) -> Vec<RawVariation> {
    let doc = extractor.document();

    let embedded = shopify::embedded_variations(doc);
    if !embedded.is_empty() {
        tracing::debug!(count = embedded.len(), source = "embedded-json", "variations found");
        return dedupe_by_sku(embedded);
    }

    let form = woo::form_variations(doc, variation_spec);
    if !form.is_empty() {
        tracing::debug!(count = form.len(), source = "variation-form", "variations found");
        return dedupe_by_sku(form);
    }

    let groups = if base.attributes.is_empty() {
        attributes::picker_groups(doc)
    } else {
        base.attributes.clone()
    };
    let synthesized = dom::synthesize(
        doc,
        &groups,
        &SynthesisBase {
            sku: base.sku.as_deref().unwrap_or_default(),
            price_text: base.price_text.as_deref().unwrap_or_default(),
            stock_text: base.stock_text.as_deref().unwrap_or_default(),
        },
    );
    if !synthesized.is_empty() {
        tracing::debug!(count = synthesized.len(), source = "dom-synthesis", "variations found");
    }
    dedupe_by_sku(synthesized)
}

/// Keeps the first occurrence of each SKU, preserving order. Rows with an
/// empty SKU are never merged with each other.
#[must_use]
pub fn dedupe_by_sku(variations: Vec<RawVariation>) -> Vec<RawVariation> {
    let mut seen = std::collections::HashSet::new();
    variations
        .into_iter()
        .filter(|v| v.sku.is_empty() || seen.insert(v.sku.clone()))
        .collect()
}
