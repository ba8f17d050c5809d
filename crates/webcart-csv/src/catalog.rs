//! Catalog CSV generation.
//!
//! Two linked payloads per job: a parent sheet with one row per product
//! and a variation sheet with one row per variation, tied together by
//! `parent_sku`. Attribute columns are dynamic: the union of attribute
//! names across all products, in first-seen order, appended after the
//! fixed columns.

use webcart_core::{NormalizedProduct, NormalizedVariation};

use crate::field::csv_row;

/// Fixed parent-sheet columns, before the per-attribute pairs.
const PARENT_COLUMNS: &[&str] = &[
    "ID",
    "post_title",
    "post_name",
    "post_status",
    "post_content",
    "post_excerpt",
    "post_parent",
    "post_type",
    "menu_order",
    "sku",
    "stock_status",
    "images",
    "tax:product_type",
    "tax:product_cat",
    "description",
    "regular_price",
    "sale_price",
];

/// Fixed variation-sheet columns: the parent set with `parent_sku`
/// replacing `post_parent`.
const VARIATION_COLUMNS: &[&str] = &[
    "ID",
    "post_title",
    "post_name",
    "post_status",
    "post_content",
    "post_excerpt",
    "parent_sku",
    "post_type",
    "menu_order",
    "sku",
    "stock_status",
    "images",
    "tax:product_type",
    "tax:product_cat",
    "description",
    "regular_price",
    "sale_price",
];

/// Multi-value attribute options are joined space-pipe-space.
const OPTION_JOIN: &str = " | ";

/// Generates the parent CSV payload. Zero products yields exactly the
/// empty string, with no header row.
#[must_use]
pub fn parent_csv(products: &[NormalizedProduct]) -> String {
    if products.is_empty() {
        return String::new();
    }

    let attribute_names = collect_attribute_names(products);

    let mut header: Vec<String> = PARENT_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    for name in &attribute_names {
        header.push(format!("attribute:{name}"));
        header.push(format!("attribute_data:{name}"));
    }

    let mut rows = vec![csv_row(&header)];
    for product in products {
        rows.push(csv_row(&parent_row(product, &attribute_names)));
    }
    rows.join("\n")
}

/// Generates the variation CSV payload: one row per variation across all
/// products. Empty string when there are no variations at all.
#[must_use]
pub fn variation_csv(products: &[NormalizedProduct]) -> String {
    let attribute_names = collect_attribute_names(products);
    let has_variations = products.iter().any(|p| !p.variations.is_empty());
    if !has_variations {
        return String::new();
    }

    let mut header: Vec<String> = VARIATION_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    for name in &attribute_names {
        header.push(format!("meta:attribute_{name}"));
    }

    let mut rows = vec![csv_row(&header)];
    for product in products {
        for variation in &product.variations {
            rows.push(csv_row(&variation_row(product, variation, &attribute_names)));
        }
    }
    rows.join("\n")
}

/// Union of attribute names across products, first-seen order.
fn collect_attribute_names(products: &[NormalizedProduct]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for product in products {
        for attribute in &product.attributes {
            if !names.contains(&attribute.name) {
                names.push(attribute.name.clone());
            }
        }
    }
    names
}

fn parent_row(product: &NormalizedProduct, attribute_names: &[String]) -> Vec<String> {
    let mut row = vec![
        String::new(),               // ID assigned by the importer
        product.title.clone(),       // post_title
        product.slug.clone(),        // post_name
        "publish".to_string(),       // post_status
        product.description.clone(), // post_content
        String::new(),               // post_excerpt
        String::new(),               // post_parent
        "product".to_string(),       // post_type
        "0".to_string(),             // menu_order
        product.sku.clone(),
        product.stock_status.clone(),
        product.images.join(","),
        product.kind().to_string(), // tax:product_type
        product.category.clone(),   // tax:product_cat
        product.description.clone(),
        product.regular_price.clone(),
        product.sale_price.clone(),
    ];

    for name in attribute_names {
        match product.attributes.iter().position(|a| &a.name == name) {
            Some(position) => {
                let attribute = &product.attributes[position];
                row.push(attribute.options.join(OPTION_JOIN));
                row.push(attribute_data(position, in_variations(product, name)));
            }
            None => {
                row.push(String::new());
                row.push(String::new());
            }
        }
    }
    row
}

fn variation_row(
    product: &NormalizedProduct,
    variation: &NormalizedVariation,
    attribute_names: &[String],
) -> Vec<String> {
    let mut row = vec![
        String::new(),                     // ID
        product.title.clone(),             // post_title
        String::new(),                     // post_name assigned by the importer
        "publish".to_string(),             // post_status
        String::new(),                     // post_content
        String::new(),                     // post_excerpt
        product.sku.clone(),               // parent_sku
        "product_variation".to_string(),   // post_type
        "0".to_string(),                   // menu_order
        variation.sku.clone(),
        variation.stock_status.clone(),
        variation.images.join(","),
        String::new(), // tax:product_type
        String::new(), // tax:product_cat
        String::new(), // description
        variation.regular_price.clone(),
        variation.sale_price.clone(),
    ];

    for name in attribute_names {
        let value = variation
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        row.push(value);
    }
    row
}

/// `position|is_visible|is_taxonomy|is_in_variations`.
fn attribute_data(position: usize, in_variations: bool) -> String {
    format!("{position}|1|0|{}", u8::from(in_variations))
}

fn in_variations(product: &NormalizedProduct, attribute_name: &str) -> bool {
    product
        .variations
        .iter()
        .any(|v| v.attributes.iter().any(|(n, _)| n == attribute_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use webcart_core::ProductAttribute;

    fn simple_product() -> NormalizedProduct {
        NormalizedProduct {
            source_url: "https://shop.example.com/p/tee".to_string(),
            title: "Organic Tee".to_string(),
            slug: "organic-tee".to_string(),
            description: "A soft tee.".to_string(),
            sku: "TEE-1".to_string(),
            stock_status: "instock".to_string(),
            images: vec![
                "https://shop.example.com/img/a.jpg".to_string(),
                "https://shop.example.com/img/b.jpg".to_string(),
            ],
            category: "Apparel".to_string(),
            attributes: vec![],
            variations: vec![],
            regular_price: "19.99".to_string(),
            sale_price: String::new(),
        }
    }

    fn variable_product() -> NormalizedProduct {
        let mut product = simple_product();
        product.sku = "TEE-V".to_string();
        product.attributes = vec![
            ProductAttribute {
                name: "Color".to_string(),
                options: vec!["Red".to_string(), "Blue".to_string()],
            },
            ProductAttribute {
                name: "Size".to_string(),
                options: vec!["S".to_string()],
            },
        ];
        product.variations = vec![NormalizedVariation {
            sku: "TEE-V-R-S".to_string(),
            regular_price: "21.99".to_string(),
            sale_price: String::new(),
            tax_class: String::new(),
            stock_status: "instock".to_string(),
            images: vec![],
            attributes: vec![
                ("Color".to_string(), "Red".to_string()),
                ("Size".to_string(), "S".to_string()),
            ],
        }];
        product
    }

    #[test]
    fn zero_products_is_exactly_empty() {
        assert_eq!(parent_csv(&[]), "");
        assert_eq!(variation_csv(&[]), "");
    }

    #[test]
    fn parent_header_and_row_counts() {
        let csv = parent_csv(&[simple_product()]);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID,post_title,post_name,post_status"));
        assert!(lines[0].ends_with("regular_price,sale_price"));
    }

    #[test]
    fn simple_product_row_values() {
        let csv = parent_csv(&[simple_product()]);
        let row = csv.split('\n').nth(1).unwrap();
        assert!(row.contains("Organic Tee"));
        assert!(row.contains("publish"));
        assert!(row.contains(",product,"));
        assert!(row.contains(",simple,"));
        // Comma-joined image list is one quoted field.
        assert!(row.contains("\"https://shop.example.com/img/a.jpg,https://shop.example.com/img/b.jpg\""));
    }

    #[test]
    fn attribute_columns_appended_per_name() {
        let csv = parent_csv(&[variable_product()]);
        let header = csv.split('\n').next().unwrap();
        assert!(header.ends_with(
            "attribute:Color,attribute_data:Color,attribute:Size,attribute_data:Size"
        ));

        let row = csv.split('\n').nth(1).unwrap();
        assert!(row.contains("Red | Blue"));
        assert!(row.contains("0|1|0|1"), "Color is position 0, in variations");
        assert!(row.contains("1|1|0|1"), "Size is position 1, in variations");
        assert!(row.contains(",variable,"));
    }

    #[test]
    fn attribute_not_in_variations_is_flagged_zero() {
        let mut product = variable_product();
        product.variations[0].attributes.retain(|(n, _)| n != "Size");
        let csv = parent_csv(&[product]);
        let row = csv.split('\n').nth(1).unwrap();
        assert!(row.contains("1|1|0|0"), "Size no longer appears in variations");
    }

    #[test]
    fn variation_sheet_links_by_parent_sku() {
        let csv = variation_csv(&[variable_product()]);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(",parent_sku,"));
        assert!(!lines[0].contains("post_parent"));
        assert!(lines[0].ends_with("meta:attribute_Color,meta:attribute_Size"));

        let row = lines[1];
        assert!(row.contains(",TEE-V,"), "parent sku present");
        assert!(row.contains(",TEE-V-R-S,"), "variation sku present");
        assert!(row.contains("product_variation"));
        assert!(row.ends_with("Red,S"));
    }

    #[test]
    fn products_without_variations_produce_no_variation_rows() {
        assert_eq!(variation_csv(&[simple_product()]), "");
    }

    #[test]
    fn hostile_title_is_escaped_in_place() {
        let mut product = simple_product();
        product.title = "Tee \"X\", special\nedition".to_string();
        let csv = parent_csv(&[product]);
        assert!(csv.contains("\"Tee \"\"X\"\", special\nedition\""));
    }
}
