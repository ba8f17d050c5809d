//! Attribute-group extraction.
//!
//! Two sources: structured name/value marker elements matched by the
//! recipe's attribute selectors, and native picker controls (`<select>`
//! elements and grouped radio inputs). Placeholder prompt options are
//! excluded from every produced option set.

use scraper::{ElementRef, Html, Selector};
use webcart_core::{ProductAttribute, SelectorSpec};

use super::{collapse_whitespace, usable_selector, ElementExtractor};

/// Prompt phrases that mark a non-selectable placeholder option.
/// English plus Hebrew storefront equivalents.
const PLACEHOLDER_PHRASES: &[&str] = &[
    "select option",
    "select an option",
    "choose an option",
    "choose option",
    "select...",
    "בחר אפשרות",
    "בחירת אפשרות",
    "בחר",
];

/// Form-field names that are never product attributes.
const NON_ATTRIBUTE_FIELDS: &[&str] = &[
    "quantity", "qty", "orderby", "sort", "currency", "country", "rating", "per_page",
];

/// Internal prefixes stripped from form field names to recover the
/// attribute name (WooCommerce emits `attribute_pa_color` for `Color`).
const FIELD_NAME_PREFIXES: &[&str] = &["attribute_pa_", "attribute_", "pa_"];

/// Returns `true` if an option label is a placeholder prompt rather than a
/// real value.
#[must_use]
pub fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    PLACEHOLDER_PHRASES
        .iter()
        .any(|p| lowered == *p || lowered.starts_with(&format!("{p} ")))
}

/// Derives a display attribute name from a form field name: strips known
/// internal prefixes, replaces separators with spaces, and capitalizes
/// each word.
#[must_use]
pub fn attribute_name_from_field(field: &str) -> String {
    let mut name = field.trim();
    for prefix in FIELD_NAME_PREFIXES {
        if let Some(stripped) = name.strip_prefix(prefix) {
            name = stripped;
            break;
        }
    }
    name.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Extracts attribute groups: configured marker elements first, then
/// picker controls for anything the markers missed.
#[must_use]
pub fn extract_attributes(
    extractor: &ElementExtractor<'_>,
    primary: Option<&SelectorSpec>,
    fallback: Option<&SelectorSpec>,
) -> Vec<ProductAttribute> {
    let mut groups = marker_attributes(extractor, primary, fallback);
    for picker in picker_groups(extractor.document()) {
        if !groups.iter().any(|g| g.name == picker.name) {
            groups.push(picker);
        }
    }
    groups
}

/// Structured name/value markers: each matched container pairs a name
/// element with its sibling value elements.
fn marker_attributes(
    extractor: &ElementExtractor<'_>,
    primary: Option<&SelectorSpec>,
    fallback: Option<&SelectorSpec>,
) -> Vec<ProductAttribute> {
    let name_sel = Selector::parse("th, dt, .attribute-name, .name, label").expect("valid selector");
    let value_sel = Selector::parse("td, dd, .attribute-value, .value, li").expect("valid selector");

    for spec in primary.into_iter().chain(fallback) {
        for selector in spec.iter().filter(|s| usable_selector(s)) {
            let Ok(parsed) = Selector::parse(selector) else {
                continue;
            };

            let mut groups: Vec<ProductAttribute> = Vec::new();
            for container in extractor.document().select(&parsed) {
                let Some(name) = container
                    .select(&name_sel)
                    .next()
                    .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                    .filter(|n| !n.is_empty())
                else {
                    continue;
                };

                let options: Vec<String> = container
                    .select(&value_sel)
                    .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                    .filter(|v| !is_placeholder(v))
                    .collect();
                let options = dedupe(options);
                if options.is_empty() {
                    continue;
                }

                push_group(&mut groups, &name, options);
            }

            if !groups.is_empty() {
                return groups;
            }
        }
    }
    Vec::new()
}

/// Picker controls: `<select>` elements and grouped radio inputs. Used for
/// attribute discovery and for DOM-driven variation synthesis.
#[must_use]
pub fn picker_groups(doc: &Html) -> Vec<ProductAttribute> {
    let mut groups: Vec<ProductAttribute> = Vec::new();

    let select_sel = Selector::parse("select[name]").expect("valid selector");
    let option_sel = Selector::parse("option").expect("valid selector");
    for select in doc.select(&select_sel) {
        let Some(field) = select.value().attr("name") else {
            continue;
        };
        if is_non_attribute_field(field) {
            continue;
        }
        let name = attribute_name_from_field(field);
        if name.is_empty() {
            continue;
        }

        let options: Vec<String> = select
            .select(&option_sel)
            .filter(|opt| !opt.value().attr("value").unwrap_or_default().is_empty())
            .map(|opt| collapse_whitespace(&opt.text().collect::<String>()))
            .filter(|label| !is_placeholder(label))
            .collect();
        let options = dedupe(options);
        if !options.is_empty() {
            push_group(&mut groups, &name, options);
        }
    }

    let radio_sel = Selector::parse(r#"input[type="radio"][name]"#).expect("valid selector");
    for radio in doc.select(&radio_sel) {
        let Some(field) = radio.value().attr("name") else {
            continue;
        };
        if is_non_attribute_field(field) {
            continue;
        }
        let name = attribute_name_from_field(field);
        if name.is_empty() {
            continue;
        }

        let Some(label) = radio_label(radio) else {
            continue;
        };
        if is_placeholder(&label) {
            continue;
        }
        push_group(&mut groups, &name, vec![label]);
    }

    groups
}

/// A radio input's value: its `value` attribute, or the text of an
/// adjacent `<label>` inside the same parent.
fn radio_label(radio: ElementRef<'_>) -> Option<String> {
    if let Some(value) = radio.value().attr("value") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    let parent = radio.parent()?;
    let label_sel = Selector::parse("label").expect("valid selector");
    ElementRef::wrap(parent)?
        .select(&label_sel)
        .next()
        .map(|l| collapse_whitespace(&l.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn is_non_attribute_field(field: &str) -> bool {
    let lowered = field.to_lowercase();
    NON_ATTRIBUTE_FIELDS
        .iter()
        .any(|f| lowered == *f || lowered.starts_with(&format!("{f}[")))
}

/// Appends options to an existing group of the same name, or starts a new
/// group. Option order within a group is preserved, duplicates dropped.
fn push_group(groups: &mut Vec<ProductAttribute>, name: &str, options: Vec<String>) {
    if let Some(existing) = groups.iter_mut().find(|g| g.name == name) {
        for option in options {
            if !existing.options.contains(&option) {
                existing.options.push(option);
            }
        }
    } else {
        groups.push(ProductAttribute {
            name: name.to_string(),
            options,
        });
    }
}

fn dedupe(options: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    options
        .into_iter()
        .filter(|o| seen.insert(o.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn attributes(html: &str, selector: Option<&str>) -> Vec<ProductAttribute> {
        let doc = Html::parse_document(html);
        let base = Url::parse("https://shop.example.com/p/1").unwrap();
        let extractor = ElementExtractor::new(&doc, &base);
        let spec = selector.map(|s| SelectorSpec::One(s.to_string()));
        extract_attributes(&extractor, spec.as_ref(), None)
    }

    #[test]
    fn placeholder_detection_english_and_hebrew() {
        assert!(is_placeholder("Select option"));
        assert!(is_placeholder("Choose an option"));
        assert!(is_placeholder("  "));
        assert!(is_placeholder("בחר אפשרות"));
        assert!(!is_placeholder("Red"));
    }

    #[test]
    fn field_name_prefix_stripping() {
        assert_eq!(attribute_name_from_field("attribute_pa_color"), "Color");
        assert_eq!(attribute_name_from_field("attribute_size"), "Size");
        assert_eq!(attribute_name_from_field("pa_shirt-style"), "Shirt Style");
        assert_eq!(attribute_name_from_field("color"), "Color");
    }

    #[test]
    fn select_control_yields_group_without_placeholder() {
        let html = r#"
            <select name="attribute_pa_color">
                <option value="">Choose an option</option>
                <option value="red">Red</option>
                <option value="blue">Blue</option>
            </select>
        "#;
        let groups = attributes(html, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Color");
        assert_eq!(groups[0].options, vec!["Red", "Blue"]);
    }

    #[test]
    fn quantity_select_is_not_an_attribute() {
        let html = r#"<select name="quantity"><option value="1">1</option></select>"#;
        assert!(attributes(html, None).is_empty());
    }

    #[test]
    fn radio_group_collects_values_under_one_name() {
        let html = r#"
            <input type="radio" name="attribute_size" value="S">
            <input type="radio" name="attribute_size" value="M">
            <input type="radio" name="attribute_size" value="L">
        "#;
        let groups = attributes(html, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Size");
        assert_eq!(groups[0].options, vec!["S", "M", "L"]);
    }

    #[test]
    fn marker_rows_pair_names_with_values() {
        let html = r#"
            <table class="attrs">
                <tr class="attr-row"><th>Color</th><td>Red</td><td>Blue</td></tr>
                <tr class="attr-row"><th>Size</th><td>S</td><td>M</td></tr>
            </table>
        "#;
        let groups = attributes(html, Some(".attr-row"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Color");
        assert_eq!(groups[0].options, vec!["Red", "Blue"]);
        assert_eq!(groups[1].name, "Size");
        assert_eq!(groups[1].options, vec!["S", "M"]);
    }

    #[test]
    fn marker_and_picker_groups_merge_without_duplicates() {
        let html = r#"
            <table><tr class="attr-row"><th>Color</th><td>Red</td></tr></table>
            <select name="attribute_size">
                <option value="">Select option</option>
                <option value="s">S</option>
            </select>
        "#;
        let groups = attributes(html, Some(".attr-row"));
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Color", "Size"]);
    }

    #[test]
    fn duplicate_option_labels_are_deduped() {
        let html = r#"
            <select name="attribute_color">
                <option value="red">Red</option>
                <option value="red2">Red</option>
            </select>
        "#;
        let groups = attributes(html, None);
        assert_eq!(groups[0].options, vec!["Red"]);
    }
}
