use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webcart_core::slugify;
use webcart_scrape::AdapterCache;

#[derive(Debug, Parser)]
#[command(name = "webcart")]
#[command(about = "Recipe-driven product-catalog crawler and CSV exporter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl a site with a named recipe and write the catalog CSV files.
    Crawl {
        /// Recipe name, resolved as `<recipes_dir>/<name>.yaml`.
        recipe: String,
        /// Site URL to crawl. Must match the recipe's site pattern.
        site_url: String,
        /// Directory the CSV files are written to.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// List the recipes available in the configured recipes directory.
    Recipes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = webcart_core::load_app_config().context("loading configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl {
            recipe,
            site_url,
            output_dir,
        } => crawl(&recipe, &site_url, &output_dir, config).await,
        Commands::Recipes => list_recipes(&config),
    }
}

async fn crawl(
    recipe_name: &str,
    site_url: &str,
    output_dir: &PathBuf,
    config: webcart_core::AppConfig,
) -> anyhow::Result<()> {
    let cache = AdapterCache::new(config);
    let adapter = cache
        .create_adapter(site_url, recipe_name)
        .await
        .with_context(|| format!("building adapter for recipe '{recipe_name}'"))?;

    tracing::info!(recipe = recipe_name, site_url, "starting crawl");
    let extracted = adapter.run().await.context("crawling site")?;

    for item in &extracted {
        for violation in &item.violations {
            tracing::warn!(
                url = %item.product.source_url,
                field = %violation.field,
                "validation: {}",
                violation.message
            );
        }
    }

    let products: Vec<_> = extracted.into_iter().map(|e| e.product).collect();
    let slug = slugify(recipe_name);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let parent_path = output_dir.join(format!("{slug}-products.csv"));
    let variation_path = output_dir.join(format!("{slug}-variations.csv"));

    std::fs::write(&parent_path, webcart_csv::parent_csv(&products))
        .with_context(|| format!("writing {}", parent_path.display()))?;
    std::fs::write(&variation_path, webcart_csv::variation_csv(&products))
        .with_context(|| format!("writing {}", variation_path.display()))?;

    let variation_count: usize = products.iter().map(|p| p.variations.len()).sum();
    tracing::info!(
        products = products.len(),
        variations = variation_count,
        parent = %parent_path.display(),
        variation = %variation_path.display(),
        "catalog export complete"
    );
    Ok(())
}

fn list_recipes(config: &webcart_core::AppConfig) -> anyhow::Result<()> {
    let recipes = webcart_core::load_recipes_dir(&config.recipes_dir)
        .with_context(|| format!("reading recipes from {}", config.recipes_dir.display()))?;

    if recipes.is_empty() {
        println!("no recipes found in {}", config.recipes_dir.display());
        return Ok(());
    }
    for recipe in recipes {
        println!("{}\t{}", recipe.name, recipe.site_url);
    }
    Ok(())
}
