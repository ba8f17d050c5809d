use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod product;
pub mod recipe;
pub mod violation;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use product::{
    slugify, NormalizedProduct, NormalizedVariation, ProductAttribute, ProductKind, RawProduct,
    RawVariation,
};
pub use recipe::{
    load_recipe, load_recipes_dir, usable_selector, BehaviorConfig, Recipe, SelectorSet,
    SelectorSpec, StockPhrases, ValidationConfig,
};
pub use violation::ValidationError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read recipe file {path}: {source}")]
    RecipeFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse recipe file: {0}")]
    RecipeFileParse(#[from] serde_yaml::Error),

    #[error("recipe validation failed: {0}")]
    Validation(String),
}
