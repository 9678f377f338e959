//! Configuration schema types
//!
//! This module defines the configuration structure for sheetfill.

use crate::adapters::grid::ValueInputMode;
use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Main sheetfill configuration
///
/// This is the root configuration structure that maps to the TOML file.
/// Every section is optional and falls back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetfillConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Grid document store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Template resources and cache
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SheetfillConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.store.validate()?;
        self.templates.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (plan and map rows, never touch the store)
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Retry configuration for rate-limited store calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Randomize each delay between zero and its computed value
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries > 10 {
            return Err("store.retry.max_retries must be <= 10".to_string());
        }
        if self.initial_delay_ms == 0 {
            return Err("store.retry.initial_delay_ms must be > 0".to_string());
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err("store.retry.max_delay_ms must be >= initial_delay_ms".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("store.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }
}

/// Grid document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the spreadsheet REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token (optional)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// How written values are interpreted (raw, user_entered)
    #[serde(default = "default_value_input_mode")]
    pub value_input_mode: String,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            timeout_seconds: default_timeout_seconds(),
            value_input_mode: default_value_input_mode(),
            retry: RetryConfig::default(),
        }
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("store.base_url cannot be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("store.base_url must start with http:// or https://".to_string());
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(format!("store.base_url '{}' is not a valid URL", self.base_url));
        }
        if self.timeout_seconds == 0 {
            return Err("store.timeout_seconds must be > 0".to_string());
        }
        self.input_mode().map_err(|e| e.to_string())?;
        self.retry.validate()?;
        Ok(())
    }

    /// Parsed value input mode
    pub fn input_mode(&self) -> crate::domain::Result<ValueInputMode> {
        ValueInputMode::from_str(&self.value_input_mode)
    }
}

/// Template resources and cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory holding `<resource_id>.json` / `<resource_id>.toml` files
    #[serde(default = "default_templates_directory")]
    pub directory: String,

    /// How long a loaded configuration is served before reloading
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    /// Maximum number of cached configurations
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Check the declared template row against the live sheet before materializing
    #[serde(default)]
    pub validate_anchor: bool,

    /// Document type -> resource id overrides
    #[serde(default)]
    pub resources: BTreeMap<String, String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: default_templates_directory(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            cache_capacity: default_cache_capacity(),
            validate_anchor: false,
            resources: BTreeMap::new(),
        }
    }
}

impl TemplatesConfig {
    fn validate(&self) -> Result<(), String> {
        if self.directory.is_empty() {
            return Err("templates.directory cannot be empty".to_string());
        }
        if self.cache_capacity == 0 {
            return Err("templates.cache_capacity must be > 0".to_string());
        }
        for (doc_type, resource_id) in &self.resources {
            crate::domain::DocumentType::from_str(doc_type)
                .map_err(|e| format!("templates.resources: {e}"))?;
            if resource_id.trim().is_empty() {
                return Err(format!("templates.resources.{doc_type} cannot be empty"));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log file path
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Maximum log file size in MB
    #[serde(default = "default_local_max_size_mb")]
    pub local_max_size_mb: usize,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_max_size_mb == 0 {
            return Err("logging.local_max_size_mb must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            local_max_size_mb: default_local_max_size_mb(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_value_input_mode() -> String {
    "user_entered".to_string()
}

fn default_max_retries() -> usize {
    5
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    32000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_templates_directory() -> String {
    "templates".to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    600
}

fn default_cache_capacity() -> usize {
    16
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

fn default_local_max_size_mb() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SheetfillConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.input_mode().unwrap(), ValueInputMode::UserEntered);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: SheetfillConfig = toml::from_str("").unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.templates.cache_capacity, 16);
        assert_eq!(config.store.retry.max_retries, 5);
        assert!(config.store.retry.jitter);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = SheetfillConfig::default();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().unwrap_err().contains("log_level"));
    }

    #[test]
    fn test_invalid_base_url_scheme() {
        let mut config = SheetfillConfig::default();
        config.store.base_url = "ftp://sheets.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_value_input_mode() {
        let mut config = SheetfillConfig::default();
        config.store.value_input_mode = "formula".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_bounds() {
        let mut config = SheetfillConfig::default();
        config.store.retry.max_retries = 11;
        assert!(config.validate().is_err());

        let mut config = SheetfillConfig::default();
        config.store.retry.max_delay_ms = 10;
        assert!(config.validate().is_err());

        let mut config = SheetfillConfig::default();
        config.store.retry.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cache_capacity() {
        let mut config = SheetfillConfig::default();
        config.templates.cache_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_resource_override() {
        let mut config = SheetfillConfig::default();
        config
            .templates
            .resources
            .insert("invoice".to_string(), "invoice_v1".to_string());
        assert!(config.validate().unwrap_err().contains("templates.resources"));
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = SheetfillConfig::default();
        config.logging.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_access_token_is_redacted_in_debug() {
        let store = StoreConfig {
            access_token: Some(crate::config::secret_string("ya29.token".to_string())),
            ..Default::default()
        };
        assert!(!format!("{store:?}").contains("ya29.token"));
    }
}
