//! Product validation.
//!
//! Runs the recipe's structural rules against a normalized product and
//! returns a flat violation list. Checks are independent: one failing
//! check never suppresses another, and violations never halt the
//! pipeline.

use regex::Regex;
use reqwest::Url;
use webcart_core::{NormalizedProduct, Recipe, ValidationError};

/// Price format accepted when the recipe configures no pattern: digits
/// with an optional two-decimal group.
const DEFAULT_PRICE_PATTERN: &str = r"^\d+(\.\d{2})?$";

/// Validates one normalized product against the recipe's rules.
#[must_use]
pub fn validate_product(product: &NormalizedProduct, recipe: &Recipe) -> Vec<ValidationError> {
    let rules = &recipe.validation;
    let mut violations = Vec::new();

    for field in &rules.required_fields {
        if field_is_blank(product, field) {
            violations.push(ValidationError::new(field, "", "required field must be non-empty"));
        }
    }

    if !product.regular_price.is_empty() {
        if let Some(pattern) = compiled_pattern(rules.price_pattern.as_deref(), DEFAULT_PRICE_PATTERN)
        {
            if !pattern.is_match(&product.regular_price) {
                violations.push(ValidationError::new(
                    "regular_price",
                    &product.regular_price,
                    &format!("price must match {}", pattern.as_str()),
                ));
            }
        }
    }

    if !product.sku.is_empty() {
        if let Some(pattern) = rules.sku_pattern.as_deref().and_then(compile_or_warn) {
            if !pattern.is_match(&product.sku) {
                violations.push(ValidationError::new(
                    "sku",
                    &product.sku,
                    &format!("sku must match {}", pattern.as_str()),
                ));
            }
        }
    }

    if let Some(min) = rules.min_description_length {
        let len = product.description.chars().count();
        if len < min {
            violations.push(ValidationError::new(
                "description",
                &product.description,
                &format!("description must be at least {min} characters, got {len}"),
            ));
        }
    }

    if let Some(max) = rules.max_title_length {
        let len = product.title.chars().count();
        if len > max {
            violations.push(ValidationError::new(
                "title",
                &product.title,
                &format!("title must be at most {max} characters, got {len}"),
            ));
        }
    }

    for (index, image) in product.images.iter().enumerate() {
        if Url::parse(image).is_err() {
            violations.push(ValidationError::new(
                &format!("images[{index}]"),
                image,
                "image URL must be absolute and well-formed",
            ));
        }
    }

    let parent_names = product.attribute_names();
    for (index, variation) in product.variations.iter().enumerate() {
        if variation.sku.trim().is_empty() {
            violations.push(ValidationError::new(
                &format!("variations[{index}].sku"),
                "",
                "variation sku must be non-empty",
            ));
        }
        if variation.stock_status.trim().is_empty() {
            violations.push(ValidationError::new(
                &format!("variations[{index}].stock_status"),
                "",
                "variation stock status must be non-empty",
            ));
        }
        for (name, value) in &variation.attributes {
            if name.trim().is_empty() || value.trim().is_empty() {
                violations.push(ValidationError::new(
                    &format!("variations[{index}].attributes"),
                    &format!("{name}={value}"),
                    "attribute assignments need a non-empty name and value",
                ));
            } else if !parent_names.contains(&name.as_str()) {
                violations.push(ValidationError::new(
                    &format!("variations[{index}].attributes"),
                    name,
                    "variation attribute must be declared on the parent product",
                ));
            }
        }
    }

    violations
}

fn field_is_blank(product: &NormalizedProduct, field: &str) -> bool {
    let value: &str = match field {
        "title" => &product.title,
        "slug" => &product.slug,
        "description" => &product.description,
        "sku" => &product.sku,
        "stock_status" => &product.stock_status,
        "category" => &product.category,
        "regular_price" | "price" => &product.regular_price,
        "images" => return product.images.is_empty(),
        _ => return false,
    };
    value.trim().is_empty()
}

/// Configured pattern if it compiles, else the built-in default. An
/// invalid configured pattern is logged and skipped, not fatal.
fn compiled_pattern(configured: Option<&str>, default: &str) -> Option<Regex> {
    if let Some(pattern) = configured {
        if let Some(compiled) = compile_or_warn(pattern) {
            return Some(compiled);
        }
    }
    Regex::new(default).ok()
}

fn compile_or_warn(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(compiled) => Some(compiled),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "skipping invalid validation pattern");
            None
        }
    }
}
