//! DOM-driven variation synthesis.
//!
//! Used when a product page exposes attribute pickers but no embedded
//! variation JSON. A probe first checks whether the page shows true
//! per-option variation (more than one distinct price or SKU text in the
//! markup). With true variation, one row is emitted per discrete option
//! value observed; without it, the Cartesian product of all option groups
//! is synthesized around the page's single base price and stock.
//!
//! The probe counts distinct price/SKU texts anywhere on the page, so
//! unrelated numeric text can both over- and under-trigger it. That is the
//! documented behavior; tests pin it as a known approximation.

use scraper::{Html, Selector};
use webcart_core::{ProductAttribute, RawVariation};

/// Selectors the true-variation probe scans for price and SKU texts.
const PRICE_PROBE_SELECTORS: &[&str] = &[".price", ".amount", r#"[itemprop="price"]"#];
const SKU_PROBE_SELECTORS: &[&str] = &[".sku", r#"[itemprop="sku"]"#];

/// Base-product context for synthesized rows.
pub struct SynthesisBase<'a> {
    pub sku: &'a str,
    pub price_text: &'a str,
    pub stock_text: &'a str,
}

/// Synthesizes variations from attribute-picker groups. Empty when no
/// groups are present.
#[must_use]
pub fn synthesize(doc: &Html, groups: &[ProductAttribute], base: &SynthesisBase<'_>) -> Vec<RawVariation> {
    let groups: Vec<&ProductAttribute> = groups.iter().filter(|g| !g.options.is_empty()).collect();
    if groups.is_empty() {
        return Vec::new();
    }

    if has_true_variation(doc) {
        per_option_rows(&groups, base)
    } else {
        cartesian_rows(&groups, base)
    }
}

/// True variation exists when more than one distinct price text or more
/// than one distinct SKU text appears in the page markup.
#[must_use]
pub fn has_true_variation(doc: &Html) -> bool {
    distinct_texts(doc, PRICE_PROBE_SELECTORS) > 1 || distinct_texts(doc, SKU_PROBE_SELECTORS) > 1
}

fn distinct_texts(doc: &Html, selectors: &[&str]) -> usize {
    let mut seen = std::collections::HashSet::new();
    for selector in selectors {
        let parsed = Selector::parse(selector).expect("valid selector");
        for el in doc.select(&parsed) {
            let text = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                seen.insert(text);
            }
        }
    }
    seen.len()
}

/// One row per discrete option value actually observed, never multiplied
/// across groups.
fn per_option_rows(groups: &[&ProductAttribute], base: &SynthesisBase<'_>) -> Vec<RawVariation> {
    let mut rows = Vec::new();
    for group in groups {
        for option in &group.options {
            rows.push(RawVariation {
                sku: suffixed_sku(base.sku, &[option.as_str()]),
                regular_price: base.price_text.to_string(),
                sale_price: String::new(),
                tax_class: String::new(),
                stock_text: base.stock_text.to_string(),
                images: Vec::new(),
                attributes: vec![(group.name.clone(), option.clone())],
            });
        }
    }
    rows
}

/// The full Cartesian product across groups: one row per option tuple,
/// priced and stocked from the base product.
fn cartesian_rows(groups: &[&ProductAttribute], base: &SynthesisBase<'_>) -> Vec<RawVariation> {
    let mut combos: Vec<Vec<(String, String)>> = vec![Vec::new()];
    for group in groups {
        let mut next = Vec::with_capacity(combos.len() * group.options.len());
        for combo in &combos {
            for option in &group.options {
                let mut extended = combo.clone();
                extended.push((group.name.clone(), option.clone()));
                next.push(extended);
            }
        }
        combos = next;
    }

    combos
        .into_iter()
        .map(|attributes| {
            let values: Vec<&str> = attributes.iter().map(|(_, v)| v.as_str()).collect();
            RawVariation {
                sku: suffixed_sku(base.sku, &values),
                regular_price: base.price_text.to_string(),
                sale_price: String::new(),
                tax_class: String::new(),
                stock_text: base.stock_text.to_string(),
                images: Vec::new(),
                attributes,
            }
        })
        .collect()
}

/// Base SKU suffixed with dash-joined option values in group order.
fn suffixed_sku(base: &str, values: &[&str]) -> String {
    let suffix = values.join("-");
    if base.trim().is_empty() {
        suffix
    } else {
        format!("{}-{}", base.trim(), suffix)
    }
}
