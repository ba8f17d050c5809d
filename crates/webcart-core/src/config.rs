use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds a value that fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds a value that fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected a boolean, got \"{other}\""),
            }),
        }
    };

    let env = parse_environment(&or_default("WEBCART_ENV", "development"));
    let log_level = or_default("WEBCART_LOG_LEVEL", "info");
    let recipes_dir = PathBuf::from(or_default("WEBCART_RECIPES_DIR", "./config/recipes"));

    let request_timeout_secs = parse_u64("WEBCART_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("WEBCART_USER_AGENT", "webcart/0.1 (catalog-export)");
    let max_retries = parse_u32("WEBCART_MAX_RETRIES", "2")?;
    let retry_backoff_base_secs = parse_u64("WEBCART_RETRY_BACKOFF_BASE_SECS", "2")?;
    let inter_request_delay_ms = parse_u64("WEBCART_INTER_REQUEST_DELAY_MS", "250")?;
    let max_pages = parse_usize("WEBCART_MAX_PAGES", "50")?;
    let max_concurrent_products = parse_usize("WEBCART_MAX_CONCURRENT_PRODUCTS", "4")?;
    let headless_enabled = parse_bool("WEBCART_HEADLESS_ENABLED", "true")?;
    let chromium_path = lookup("WEBCART_CHROMIUM_PATH").ok().map(PathBuf::from);

    Ok(AppConfig {
        env,
        log_level,
        recipes_dir,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        inter_request_delay_ms,
        max_pages,
        max_concurrent_products,
        headless_enabled,
        chromium_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_known_values() {
        assert_eq!(parse_environment("development"), Environment::Development);
        assert_eq!(parse_environment("test"), Environment::Test);
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn build_app_config_all_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.recipes_dir, PathBuf::from("./config/recipes"));
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.user_agent, "webcart/0.1 (catalog-export)");
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.retry_backoff_base_secs, 2);
        assert_eq!(cfg.inter_request_delay_ms, 250);
        assert_eq!(cfg.max_pages, 50);
        assert_eq!(cfg.max_concurrent_products, 4);
        assert!(cfg.headless_enabled);
        assert!(cfg.chromium_path.is_none());
    }

    #[test]
    fn build_app_config_overrides() {
        let mut map = HashMap::new();
        map.insert("WEBCART_MAX_PAGES", "10");
        map.insert("WEBCART_HEADLESS_ENABLED", "false");
        map.insert("WEBCART_CHROMIUM_PATH", "/opt/chromium/chrome");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.max_pages, 10);
        assert!(!cfg.headless_enabled);
        assert_eq!(
            cfg.chromium_path,
            Some(PathBuf::from("/opt/chromium/chrome"))
        );
    }

    #[test]
    fn build_app_config_invalid_number() {
        let mut map = HashMap::new();
        map.insert("WEBCART_MAX_PAGES", "lots");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WEBCART_MAX_PAGES"),
            "expected InvalidEnvVar(WEBCART_MAX_PAGES), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_invalid_bool() {
        let mut map = HashMap::new();
        map.insert("WEBCART_HEADLESS_ENABLED", "maybe");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WEBCART_HEADLESS_ENABLED"),
            "expected InvalidEnvVar(WEBCART_HEADLESS_ENABLED), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_bool_aliases() {
        let mut map = HashMap::new();
        map.insert("WEBCART_HEADLESS_ENABLED", "0");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(!cfg.headless_enabled);
    }
}
