use serde::{Deserialize, Serialize};

/// Derived product classification: a product with zero variations is
/// simple, one with any is variable. Never configured directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Simple,
    Variable,
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductKind::Simple => write!(f, "simple"),
            ProductKind::Variable => write!(f, "variable"),
        }
    }
}

/// One attribute group discovered on a product page, e.g. `Color` with
/// options `["Red", "Blue"]`. Order of discovery is preserved; it becomes
/// the attribute's position in the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    pub options: Vec<String>,
}

/// Extraction output before normalization. Every field mirrors the final
/// product shape but is optional: an extraction miss is an absent value,
/// never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProduct {
    pub source_url: String,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    /// Raw stock text as found on the page, e.g. `"In Stock"`.
    pub stock_text: Option<String>,
    pub images: Vec<String>,
    pub category: Option<String>,
    pub attributes: Vec<ProductAttribute>,
    pub variations: Vec<RawVariation>,
    /// Raw price text as found on the page, e.g. `"$1,299.00"`.
    pub price_text: Option<String>,
}

/// A single variation row before normalization.
///
/// Soft invariant: attribute keys must be a subset of the parent product's
/// attribute names. Violations are reported by the validator, not fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVariation {
    pub sku: String,
    pub regular_price: String,
    pub sale_price: String,
    pub tax_class: String,
    pub stock_text: String,
    pub images: Vec<String>,
    /// Attribute name → single chosen value, in group order.
    pub attributes: Vec<(String, String)>,
}

/// Canonical product form: prices cleaned, stock status normalized,
/// attribute names in deterministic casing, variations deduplicated by SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedProduct {
    pub source_url: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub sku: String,
    /// One of `instock`, `outofstock`, `preorder`, `backorder`, `unknown`.
    pub stock_status: String,
    pub images: Vec<String>,
    pub category: String,
    pub attributes: Vec<ProductAttribute>,
    pub variations: Vec<NormalizedVariation>,
    /// Plain digit string with at most one dot, e.g. `"1299.00"`.
    pub regular_price: String,
    pub sale_price: String,
}

impl NormalizedProduct {
    #[must_use]
    pub fn kind(&self) -> ProductKind {
        if self.variations.is_empty() {
            ProductKind::Simple
        } else {
            ProductKind::Variable
        }
    }

    /// Returns the attribute group names in discovery order.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedVariation {
    pub sku: String,
    pub regular_price: String,
    pub sale_price: String,
    pub tax_class: String,
    pub stock_status: String,
    pub images: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

/// Generate a URL-safe slug from a product title.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c == ' ' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_variation(sku: &str) -> NormalizedVariation {
        NormalizedVariation {
            sku: sku.to_string(),
            regular_price: "19.99".to_string(),
            sale_price: String::new(),
            tax_class: String::new(),
            stock_status: "instock".to_string(),
            images: vec![],
            attributes: vec![("Color".to_string(), "Red".to_string())],
        }
    }

    fn make_product(variations: Vec<NormalizedVariation>) -> NormalizedProduct {
        NormalizedProduct {
            source_url: "https://shop.example.com/products/tee".to_string(),
            title: "Organic Tee".to_string(),
            slug: "organic-tee".to_string(),
            description: "A very soft tee.".to_string(),
            sku: "TEE-1".to_string(),
            stock_status: "instock".to_string(),
            images: vec!["https://shop.example.com/img/tee.jpg".to_string()],
            category: "Apparel".to_string(),
            attributes: vec![ProductAttribute {
                name: "Color".to_string(),
                options: vec!["Red".to_string(), "Blue".to_string()],
            }],
            variations,
            regular_price: "19.99".to_string(),
            sale_price: String::new(),
        }
    }

    #[test]
    fn kind_simple_when_no_variations() {
        assert_eq!(make_product(vec![]).kind(), ProductKind::Simple);
    }

    #[test]
    fn kind_variable_when_any_variation() {
        let product = make_product(vec![make_variation("TEE-1-red")]);
        assert_eq!(product.kind(), ProductKind::Variable);
    }

    #[test]
    fn kind_display_matches_export_vocabulary() {
        assert_eq!(ProductKind::Simple.to_string(), "simple");
        assert_eq!(ProductKind::Variable.to_string(), "variable");
    }

    #[test]
    fn attribute_names_preserve_order() {
        let mut product = make_product(vec![]);
        product.attributes.push(ProductAttribute {
            name: "Size".to_string(),
            options: vec!["S".to_string()],
        });
        assert_eq!(product.attribute_names(), vec!["Color", "Size"]);
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Organic Tee"), "organic-tee");
    }

    #[test]
    fn slugify_collapses_punctuation_and_repeats() {
        assert_eq!(slugify("Mr. Fox's  Hat -- Deluxe!"), "mr-foxs-hat-deluxe");
    }

    #[test]
    fn slugify_empty_input() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn serde_roundtrip_raw_product() {
        let raw = RawProduct {
            source_url: "https://shop.example.com/p/1".to_string(),
            title: Some("Tee".to_string()),
            price_text: Some("$19.99".to_string()),
            ..RawProduct::default()
        };
        let json = serde_json::to_string(&raw).expect("serialization failed");
        let decoded: RawProduct = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(decoded.title.as_deref(), Some("Tee"));
        assert_eq!(decoded.price_text.as_deref(), Some("$19.99"));
        assert!(decoded.sku.is_none());
    }
}
