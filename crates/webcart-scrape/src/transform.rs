//! Raw-to-canonical normalization.
//!
//! Price cleaning, stock-status mapping, and the per-field text-transform
//! pipeline. All operations are total: malformed input degrades to an
//! empty or pass-through value, never an error.

use regex::Regex;
use webcart_core::{
    NormalizedProduct, NormalizedVariation, ProductAttribute, RawProduct, RawVariation, Recipe,
};

/// Cleans a raw price string to a plain digit string with at most one dot.
///
/// Currency symbols and other non-numeric characters are stripped first.
/// The separator before a trailing one- or two-digit group is the decimal
/// point; a trailing three-digit group marks a thousands separator.
/// Idempotent: cleaning an already-clean string returns it unchanged.
#[must_use]
pub fn clean_price(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if kept.is_empty() {
        return String::new();
    }

    let Some(last_sep) = kept.rfind(['.', ',']) else {
        return kept;
    };

    let trailing_digits = kept.len() - last_sep - 1;
    let decimal = matches!(trailing_digits, 1 | 2);

    let mut out = String::with_capacity(kept.len());
    for (i, c) in kept.char_indices() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if i == last_sep && decimal {
            out.push('.');
        }
    }
    out
}

/// Maps arbitrary stock text to the canonical vocabulary. Substring rules
/// apply in priority order so "currently out of stock" never reads as
/// available.
#[must_use]
pub fn normalize_stock(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let status = if ["out of stock", "outofstock", "unavailable", "sold out"]
        .iter()
        .any(|p| lowered.contains(p))
    {
        "outofstock"
    } else if ["in stock", "instock", "available"]
        .iter()
        .any(|p| lowered.contains(p))
    {
        "instock"
    } else if ["pre-order", "preorder", "pre order"]
        .iter()
        .any(|p| lowered.contains(p))
    {
        "preorder"
    } else if ["backorder", "back-order", "back order"]
        .iter()
        .any(|p| lowered.contains(p))
    {
        "backorder"
    } else {
        "unknown"
    };
    status.to_string()
}

/// One parsed transform step.
enum TransformStep {
    Regex { pattern: Regex, replacement: String },
    Trim { chars: Option<String> },
    Replace { search: String, replacement: String },
}

/// `regex:pattern->replacement`, `trim`, `trim:chars`, or
/// `replace:search|replacement`. `None` for a malformed step.
fn parse_step(step: &str) -> Option<TransformStep> {
    if let Some(rest) = step.strip_prefix("regex:") {
        let (pattern, replacement) = rest.split_once("->")?;
        let compiled = match Regex::new(pattern) {
            Ok(re) => re,
            Err(err) => {
                tracing::warn!(pattern, error = %err, "skipping transform with invalid regex");
                return None;
            }
        };
        return Some(TransformStep::Regex {
            pattern: compiled,
            replacement: replacement.to_string(),
        });
    }
    if step == "trim" {
        return Some(TransformStep::Trim { chars: None });
    }
    if let Some(chars) = step.strip_prefix("trim:") {
        return Some(TransformStep::Trim {
            chars: Some(chars.to_string()),
        });
    }
    if let Some(rest) = step.strip_prefix("replace:") {
        let (search, replacement) = rest.split_once('|')?;
        return Some(TransformStep::Replace {
            search: search.to_string(),
            replacement: replacement.to_string(),
        });
    }
    None
}

/// Applies an ordered transform pipeline to one field value. Malformed
/// steps are skipped without aborting the pipeline.
#[must_use]
pub fn apply_transforms(value: &str, steps: &[String]) -> String {
    let mut current = value.to_string();
    for step in steps {
        let Some(parsed) = parse_step(step) else {
            tracing::debug!(step, "skipping malformed transform step");
            continue;
        };
        current = match parsed {
            TransformStep::Regex { pattern, replacement } => {
                pattern.replace_all(&current, replacement.as_str()).into_owned()
            }
            TransformStep::Trim { chars: None } => current.trim().to_string(),
            TransformStep::Trim { chars: Some(set) } => {
                let set: Vec<char> = set.chars().collect();
                current.trim_matches(|c| set.contains(&c)).to_string()
            }
            TransformStep::Replace { search, replacement } => current.replace(&search, &replacement),
        };
    }
    current
}

/// Deterministic attribute-name casing: each word capitalized.
fn canonical_attribute_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn transformed(recipe: &Recipe, field: &str, value: Option<&str>) -> String {
    let value = value.unwrap_or_default();
    match recipe.transforms.get(field) {
        Some(steps) => apply_transforms(value, steps),
        None => value.to_string(),
    }
}

/// Normalizes a raw extraction result into the canonical product form:
/// per-field transforms, price cleaning, stock mapping, slug derivation,
/// attribute-name casing, and variation dedup.
#[must_use]
pub fn normalize_product(raw: &RawProduct, recipe: &Recipe) -> NormalizedProduct {
    let title = transformed(recipe, "title", raw.title.as_deref());
    let slug = raw
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| webcart_core::slugify(&title));

    let stock_status = normalize_stock(&transformed(recipe, "stock", raw.stock_text.as_deref()));

    let variations: Vec<NormalizedVariation> = raw
        .variations
        .iter()
        .map(|v| normalize_variation(v, &stock_status))
        .collect();
    let variations = dedupe_normalized(variations);

    NormalizedProduct {
        source_url: raw.source_url.clone(),
        title,
        slug,
        description: transformed(recipe, "description", raw.description.as_deref()),
        sku: transformed(recipe, "sku", raw.sku.as_deref()),
        stock_status,
        images: raw.images.clone(),
        category: transformed(recipe, "category", raw.category.as_deref()),
        attributes: raw
            .attributes
            .iter()
            .map(|a| ProductAttribute {
                name: canonical_attribute_name(&a.name),
                options: a.options.clone(),
            })
            .collect(),
        variations,
        regular_price: clean_price(&transformed(recipe, "price", raw.price_text.as_deref())),
        sale_price: String::new(),
    }
}

/// A variation with no stock text of its own inherits the parent status.
fn normalize_variation(raw: &RawVariation, parent_stock: &str) -> NormalizedVariation {
    let stock_status = if raw.stock_text.trim().is_empty() {
        parent_stock.to_string()
    } else {
        normalize_stock(&raw.stock_text)
    };

    NormalizedVariation {
        sku: raw.sku.trim().to_string(),
        regular_price: clean_price(&raw.regular_price),
        sale_price: clean_price(&raw.sale_price),
        tax_class: raw.tax_class.clone(),
        stock_status,
        images: raw.images.clone(),
        attributes: raw
            .attributes
            .iter()
            .map(|(name, value)| (canonical_attribute_name(name), value.clone()))
            .collect(),
    }
}

/// First occurrence of each SKU wins, same rule as the raw-side dedup.
fn dedupe_normalized(variations: Vec<NormalizedVariation>) -> Vec<NormalizedVariation> {
    let mut seen = std::collections::HashSet::new();
    variations
        .into_iter()
        .filter(|v| v.sku.is_empty() || seen.insert(v.sku.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_price_strips_currency() {
        assert_eq!(clean_price("$1,299.99"), "1299.99");
        assert_eq!(clean_price("19.99 USD"), "19.99");
        assert_eq!(clean_price("₪ 250"), "250");
    }

    #[test]
    fn clean_price_european_format() {
        assert_eq!(clean_price("1.299,99 €"), "1299.99");
        assert_eq!(clean_price("1.299"), "1299", "trailing 3-digit group is thousands");
    }

    #[test]
    fn clean_price_single_decimal_digit() {
        assert_eq!(clean_price("19.5"), "19.5");
    }

    #[test]
    fn clean_price_is_idempotent() {
        for input in ["$1,299.99", "1.299,99", "19.5", "abc", "", "1.299", "250"] {
            let once = clean_price(input);
            assert_eq!(clean_price(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn clean_price_empty_for_no_digits() {
        assert_eq!(clean_price("TBD"), "");
    }

    #[test]
    fn stock_priority_out_before_in() {
        assert_eq!(normalize_stock("Currently out of stock"), "outofstock");
        assert_eq!(normalize_stock("In Stock"), "instock");
        assert_eq!(normalize_stock("Available for pre-order"), "instock",
            "available outranks preorder in rule order");
        assert_eq!(normalize_stock("Pre-order now"), "preorder");
        assert_eq!(normalize_stock("On backorder"), "backorder");
        assert_eq!(normalize_stock("Ships whenever"), "unknown");
    }

    #[test]
    fn transforms_apply_in_order() {
        let steps = vec![
            "replace:NEW! |".to_string(),
            "regex:\\s+-> ".to_string(),
            "trim".to_string(),
        ];
        assert_eq!(apply_transforms("  NEW! Organic   Tee  ", &steps), "Organic Tee");
    }

    #[test]
    fn trim_with_character_class() {
        let steps = vec!["trim:-* ".to_string()];
        assert_eq!(apply_transforms("-- Tee **", &steps), "Tee");
    }

    #[test]
    fn malformed_steps_are_skipped() {
        let steps = vec![
            "regex:no-arrow-here".to_string(),
            "regex:[invalid->x".to_string(),
            "bogus:thing".to_string(),
            "trim".to_string(),
        ];
        assert_eq!(apply_transforms("  keep me  ", &steps), "keep me");
    }

    fn recipe_with_transforms() -> Recipe {
        let yaml = r#"
name: test-shop
site_url: shop.example.com
selectors:
  title: h1
transforms:
  title:
    - "replace:NEW! |"
    - trim
"#;
        serde_yaml::from_str(yaml).expect("recipe parses")
    }

    #[test]
    fn normalize_product_full_pass() {
        let raw = RawProduct {
            source_url: "https://shop.example.com/p/tee".to_string(),
            title: Some("NEW! Organic Tee".to_string()),
            sku: Some("TEE-1".to_string()),
            stock_text: Some("In Stock".to_string()),
            price_text: Some("$1,299.00".to_string()),
            attributes: vec![ProductAttribute {
                name: "shirt color".to_string(),
                options: vec!["Red".to_string()],
            }],
            variations: vec![
                RawVariation {
                    sku: "TEE-1-R".to_string(),
                    regular_price: "$24.99".to_string(),
                    ..RawVariation::default()
                },
                RawVariation {
                    sku: "TEE-1-R".to_string(),
                    regular_price: "$99.00".to_string(),
                    ..RawVariation::default()
                },
            ],
            ..RawProduct::default()
        };

        let product = normalize_product(&raw, &recipe_with_transforms());
        assert_eq!(product.title, "Organic Tee");
        assert_eq!(product.slug, "organic-tee");
        assert_eq!(product.regular_price, "1299.00");
        assert_eq!(product.stock_status, "instock");
        assert_eq!(product.attributes[0].name, "Shirt Color");
        assert_eq!(product.variations.len(), 1, "duplicate SKU dropped");
        assert_eq!(product.variations[0].regular_price, "24.99");
        assert_eq!(
            product.variations[0].stock_status, "instock",
            "empty variation stock inherits parent"
        );
    }

    #[test]
    fn explicit_slug_is_kept() {
        let raw = RawProduct {
            title: Some("Organic Tee".to_string()),
            slug: Some("custom-slug".to_string()),
            ..RawProduct::default()
        };
        let product = normalize_product(&raw, &recipe_with_transforms());
        assert_eq!(product.slug, "custom-slug");
    }
}
