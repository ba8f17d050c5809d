//! Recipe and adapter caching.
//!
//! Recipes are loaded once per distinct name from the recipes directory.
//! Adapters are memoized per (recipe name, site URL) with a single-flight
//! guarantee: concurrent first-time requests for the same key converge on
//! one constructed instance instead of racing to build duplicates.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use webcart_core::{AppConfig, Recipe};

use crate::adapter::SiteAdapter;
use crate::error::ScrapeError;

type AdapterKey = (String, String);

pub struct AdapterCache {
    config: AppConfig,
    recipes: Mutex<HashMap<String, Arc<Recipe>>>,
    adapters: Mutex<HashMap<AdapterKey, Arc<OnceCell<Arc<SiteAdapter>>>>>,
}

impl AdapterCache {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            recipes: Mutex::new(HashMap::new()),
            adapters: Mutex::new(HashMap::new()),
        }
    }

    /// Loads a recipe by name, reading `<recipes_dir>/<name>.yaml` at most
    /// once.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::UnknownRecipe`] when no recipe file exists
    /// for `name`, or a config error when the file fails to parse or
    /// validate.
    pub async fn get_recipe(&self, name: &str) -> Result<Arc<Recipe>, ScrapeError> {
        let mut recipes = self.recipes.lock().await;
        if let Some(recipe) = recipes.get(name) {
            return Ok(Arc::clone(recipe));
        }

        let path = ["yaml", "yml"]
            .iter()
            .map(|ext| self.config.recipes_dir.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
            .ok_or_else(|| ScrapeError::UnknownRecipe {
                name: name.to_string(),
                dir: self.config.recipes_dir.display().to_string(),
            })?;

        let recipe = Arc::new(webcart_core::load_recipe(&path)?);
        tracing::debug!(name, path = %path.display(), "recipe loaded");
        recipes.insert(name.to_string(), Arc::clone(&recipe));
        Ok(recipe)
    }

    /// Returns the adapter for `(recipe_name, site_url)`, constructing it
    /// at most once even under concurrent first-time calls.
    ///
    /// # Errors
    ///
    /// Propagates recipe-loading and adapter-construction errors. A failed
    /// construction is not cached; the next call retries.
    pub async fn create_adapter(
        &self,
        site_url: &str,
        recipe_name: &str,
    ) -> Result<Arc<SiteAdapter>, ScrapeError> {
        let cell = {
            let mut adapters = self.adapters.lock().await;
            let key = (recipe_name.to_string(), site_url.to_string());
            Arc::clone(adapters.entry(key).or_default())
        };

        cell.get_or_try_init(|| async {
            let recipe = self.get_recipe(recipe_name).await?;
            tracing::info!(recipe = recipe_name, site_url, "building site adapter");
            SiteAdapter::new(site_url, recipe, &self.config).map(Arc::new)
        })
        .await
        .cloned()
    }

    /// Drops every cached recipe and adapter.
    pub async fn clear_caches(&self) {
        self.recipes.lock().await.clear();
        self.adapters.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    fn recipes_dir_with(name: &str, site_url: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "webcart-cache-test-{}-{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let yaml = format!("name: {name}\nsite_url: {site_url}\nselectors:\n  title: h1\n");
        std::fs::write(dir.join(format!("{name}.yaml")), yaml).unwrap();
        dir
    }

    fn config(recipes_dir: PathBuf) -> AppConfig {
        AppConfig {
            recipes_dir,
            headless_enabled: false,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn recipe_is_loaded_once_and_shared() {
        let dir = recipes_dir_with("shop", "shop.example.com");
        let cache = AdapterCache::new(config(dir.clone()));

        let first = cache.get_recipe("shop").await.unwrap();
        // Removing the file proves the second call hits the cache.
        std::fs::remove_file(dir.join("shop.yaml")).unwrap();
        let second = cache.get_recipe("shop").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn unknown_recipe_is_an_error() {
        let dir = recipes_dir_with("shop", "shop.example.com");
        let cache = AdapterCache::new(config(dir));
        let err = cache.get_recipe("nonexistent").await.unwrap_err();
        assert!(matches!(err, ScrapeError::UnknownRecipe { .. }));
    }

    #[tokio::test]
    async fn concurrent_create_adapter_calls_converge_on_one_instance() {
        let dir = recipes_dir_with("shop", "shop.example.com");
        let cache = Arc::new(AdapterCache::new(config(dir)));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .create_adapter("https://shop.example.com/", "shop")
                    .await
                    .unwrap()
            }));
        }

        let mut adapters = Vec::new();
        for handle in handles {
            adapters.push(handle.await.unwrap());
        }
        for adapter in &adapters[1..] {
            assert!(Arc::ptr_eq(&adapters[0], adapter));
        }
    }

    #[tokio::test]
    async fn clear_caches_forces_rebuild() {
        let dir = recipes_dir_with("shop", "shop.example.com");
        let cache = AdapterCache::new(config(dir));

        let first = cache
            .create_adapter("https://shop.example.com/", "shop")
            .await
            .unwrap();
        cache.clear_caches().await;
        let second = cache
            .create_adapter("https://shop.example.com/", "shop")
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn failed_construction_is_not_cached() {
        let dir = recipes_dir_with("shop", "shop.example.com");
        let cache = AdapterCache::new(config(dir));

        let err = cache
            .create_adapter("https://wrong.example.org/", "shop")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::RecipeSiteMismatch { .. }));

        // The matching site still builds fine afterwards.
        cache
            .create_adapter("https://shop.example.com/", "shop")
            .await
            .unwrap();
    }
}
