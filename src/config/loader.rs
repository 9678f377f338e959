//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SheetfillConfig;
use super::secret::secret_string_opt;
use crate::domain::{Result, SheetfillError};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`SheetfillConfig`]
/// 4. Applies environment variable overrides (`SHEETFILL_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`SheetfillError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or validation
/// fails.
///
/// # Examples
///
/// ```no_run
/// use sheetfill::config::load_config;
///
/// let config = load_config("sheetfill.toml").expect("Failed to load config");
/// println!("templates in {}", config.templates.directory);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SheetfillConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SheetfillError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SheetfillError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Same as [`load_config`] for in-memory TOML text
pub fn load_config_from_str(contents: &str) -> Result<SheetfillConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SheetfillConfig = toml::from_str(&contents)
        .map_err(|e| SheetfillError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        SheetfillError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env pattern is valid"))
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched. Every missing variable is reported at
/// once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(SheetfillError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the `SHEETFILL_*` prefix
///
/// Variables follow the pattern `SHEETFILL_<SECTION>_<KEY>`, for example
/// `SHEETFILL_STORE_BASE_URL` or `SHEETFILL_TEMPLATES_DIRECTORY`. Values that
/// fail to parse are ignored.
fn apply_env_overrides(config: &mut SheetfillConfig) {
    fn var(name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    // Application overrides
    if let Some(val) = var("SHEETFILL_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = var("SHEETFILL_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Store overrides
    if let Some(val) = var("SHEETFILL_STORE_BASE_URL") {
        config.store.base_url = val;
    }
    if let Some(val) = var("SHEETFILL_STORE_ACCESS_TOKEN") {
        config.store.access_token = secret_string_opt(Some(val));
    }
    if let Some(val) = var("SHEETFILL_STORE_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.store.timeout_seconds = timeout;
        }
    }
    if let Some(val) = var("SHEETFILL_STORE_VALUE_INPUT_MODE") {
        config.store.value_input_mode = val;
    }
    if let Some(val) = var("SHEETFILL_STORE_RETRY_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.store.retry.max_retries = retries;
        }
    }

    // Template overrides
    if let Some(val) = var("SHEETFILL_TEMPLATES_DIRECTORY") {
        config.templates.directory = val;
    }
    if let Some(val) = var("SHEETFILL_TEMPLATES_CACHE_TTL_SECONDS") {
        if let Ok(ttl) = val.parse() {
            config.templates.cache_ttl_seconds = ttl;
        }
    }
    if let Some(val) = var("SHEETFILL_TEMPLATES_VALIDATE_ANCHOR") {
        config.templates.validate_anchor = val.parse().unwrap_or(false);
    }

    // Logging overrides
    if let Some(val) = var("SHEETFILL_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Some(val) = var("SHEETFILL_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
