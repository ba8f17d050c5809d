use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide configuration, read once at startup from `WEBCART_*`
/// environment variables. Everything except the recipe files themselves
/// lives here; per-site knobs belong to [`crate::Recipe`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Directory holding one `<name>.yaml` recipe file per site.
    pub recipes_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for retryable load errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_backoff_base_secs: u64,
    /// Delay between successive page fetches on the same site.
    pub inter_request_delay_ms: u64,
    /// Hard cap on pagination depth per site.
    pub max_pages: usize,
    /// Upper bound for the orchestrator's product-page worker pool.
    pub max_concurrent_products: usize,
    /// Global kill switch for the headless loader; recipes opt in per site.
    pub headless_enabled: bool,
    /// Explicit Chromium binary path; discovered from `PATH` when unset.
    pub chromium_path: Option<PathBuf>,
}

/// Mirrors the defaults applied when a `WEBCART_*` variable is unset.
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: Environment::Development,
            log_level: "info".to_string(),
            recipes_dir: PathBuf::from("./config/recipes"),
            request_timeout_secs: 30,
            user_agent: "webcart/0.1 (catalog-export)".to_string(),
            max_retries: 2,
            retry_backoff_base_secs: 2,
            inter_request_delay_ms: 250,
            max_pages: 50,
            max_concurrent_products: 4,
            headless_enabled: true,
            chromium_path: None,
        }
    }
}
