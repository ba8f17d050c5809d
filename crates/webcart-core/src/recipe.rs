use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A CSS selector field that accepts either a single selector or an ordered
/// list of fallback selectors. Selectors are tried strictly in order; the
/// first one producing a non-empty result wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorSpec {
    One(String),
    Many(Vec<String>),
}

impl SelectorSpec {
    /// The ordered selector list this spec represents.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            SelectorSpec::One(s) => std::slice::from_ref(s),
            SelectorSpec::Many(list) => list.as_slice(),
        }
        .iter()
        .map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            SelectorSpec::One(s) => s.trim().is_empty(),
            SelectorSpec::Many(list) => list.iter().all(|s| s.trim().is_empty()),
        }
    }
}

/// Per-field selector configuration. Every field is optional; an absent
/// field means "do not extract".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub title: Option<SelectorSpec>,
    pub price: Option<SelectorSpec>,
    pub images: Option<SelectorSpec>,
    pub stock: Option<SelectorSpec>,
    pub sku: Option<SelectorSpec>,
    pub description: Option<SelectorSpec>,
    pub category: Option<SelectorSpec>,
    pub product_links: Option<SelectorSpec>,
    pub attributes: Option<SelectorSpec>,
    pub variations: Option<SelectorSpec>,
    pub next_page: Option<SelectorSpec>,
}

/// Literal phrases matched (case-insensitively) against stock elements or
/// the page body to decide availability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockPhrases {
    pub in_stock: Vec<String>,
    pub out_of_stock: Vec<String>,
}

/// Extraction behavior knobs for one site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Render pages with the headless browser instead of the static fetcher.
    pub use_headless_browser: bool,
    /// Delay between page fetches on this site, overriding the global default.
    pub rate_limit_ms: Option<u64>,
    /// Additional page-load attempts on this site, overriding the global
    /// default.
    pub max_retries: Option<u32>,
    /// Truncate discovery at `max_products` URLs.
    pub fast_mode: bool,
    pub max_products: Option<usize>,
}

/// Structural rules the validator checks extracted products against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Field names that must be present and non-blank.
    pub required_fields: Vec<String>,
    /// Regex the cleaned price must match. Defaults to digits with an
    /// optional two-decimal group.
    pub price_pattern: Option<String>,
    /// Regex the SKU must match.
    pub sku_pattern: Option<String>,
    pub min_description_length: Option<usize>,
    pub max_title_length: Option<usize>,
}

/// Declarative per-site extraction configuration. Loaded once per distinct
/// name and treated as read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    /// Site URL pattern; a `*.` prefix on the host matches any subdomain.
    pub site_url: String,
    #[serde(default)]
    pub selectors: SelectorSet,
    /// Secondary selector sets, consulted only when the corresponding
    /// primary selector set yields nothing.
    #[serde(default)]
    pub fallbacks: Option<SelectorSet>,
    /// Ordered text-transform steps per field name.
    #[serde(default)]
    pub transforms: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub stock_phrases: StockPhrases,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Recipe {
    /// Returns `true` if `url`'s host matches this recipe's `site_url`
    /// pattern. A `*.` host prefix matches both the apex domain and any
    /// subdomain.
    #[must_use]
    pub fn matches_site(&self, url: &str) -> bool {
        let Some(pattern_host) = host_of(&self.site_url) else {
            return false;
        };
        let Some(url_host) = host_of(url) else {
            return false;
        };

        if let Some(apex) = pattern_host.strip_prefix("*.") {
            url_host == apex || url_host.ends_with(&format!(".{apex}"))
        } else {
            url_host == pattern_host
        }
    }
}

/// Extracts the lowercased host portion of a URL or URL pattern.
fn host_of(url: &str) -> Option<String> {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let host = without_scheme.split('/').next()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_lowercase())
}

/// Load and validate a single recipe from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// structural validation.
pub fn load_recipe(path: &Path) -> Result<Recipe, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RecipeFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let recipe: Recipe = serde_yaml::from_str(&content)?;
    validate_recipe(&recipe)?;
    Ok(recipe)
}

/// Load every `*.yaml` recipe in a directory, rejecting duplicate names.
///
/// # Errors
///
/// Returns `ConfigError` on I/O failure, parse failure, failed structural
/// validation, or duplicate recipe names across files.
pub fn load_recipes_dir(dir: &Path) -> Result<Vec<Recipe>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::RecipeFileIo {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut recipes = Vec::new();
    let mut seen_names = HashSet::new();

    let mut paths: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    paths.sort();

    for path in paths {
        let recipe = load_recipe(&path)?;
        if !seen_names.insert(recipe.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate recipe name: '{}' (from {})",
                recipe.name,
                path.display()
            )));
        }
        recipes.push(recipe);
    }

    Ok(recipes)
}

fn validate_recipe(recipe: &Recipe) -> Result<(), ConfigError> {
    if recipe.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "recipe name must be non-empty".to_string(),
        ));
    }

    if host_of(&recipe.site_url).is_none() {
        return Err(ConfigError::Validation(format!(
            "recipe '{}' has an invalid site_url: '{}'",
            recipe.name, recipe.site_url
        )));
    }

    let empty_spec = |spec: &Option<SelectorSpec>| spec.as_ref().is_some_and(SelectorSpec::is_empty);
    let sets = [("selectors", &recipe.selectors)]
        .into_iter()
        .chain(recipe.fallbacks.as_ref().map(|f| ("fallbacks", f)));
    for (label, set) in sets {
        for (field, spec) in [
            ("title", &set.title),
            ("price", &set.price),
            ("images", &set.images),
            ("stock", &set.stock),
            ("sku", &set.sku),
            ("description", &set.description),
            ("category", &set.category),
            ("product_links", &set.product_links),
            ("attributes", &set.attributes),
            ("variations", &set.variations),
            ("next_page", &set.next_page),
        ] {
            if empty_spec(spec) {
                return Err(ConfigError::Validation(format!(
                    "recipe '{}': {label}.{field} is present but empty",
                    recipe.name
                )));
            }
            for selector in spec.iter().flat_map(SelectorSpec::iter) {
                if !usable_selector(selector) {
                    tracing::warn!(
                        recipe = %recipe.name,
                        field = %format!("{label}.{field}"),
                        selector,
                        "selector is too broad and will be ignored at extraction time"
                    );
                }
            }
        }
    }

    Ok(())
}

/// Pre-filter dropping selectors too broad or noisy to be useful: the
/// universal selector, bare tag names, and document-level tags. The
/// extraction cascade skips these; the recipe loader warns about them.
#[must_use]
pub fn usable_selector(selector: &str) -> bool {
    let trimmed = selector.trim();
    if trimmed.is_empty() || trimmed == "*" {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    if matches!(lowered.as_str(), "body" | "html" | "script") {
        return false;
    }
    // A selector that is nothing but an element name matches far too much.
    !trimmed.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
#[path = "recipe_test.rs"]
mod tests;
