//! Configuration management for sheetfill.
//!
//! TOML configuration with `${VAR_NAME}` environment substitution,
//! `SHEETFILL_<SECTION>_<KEY>` overrides, defaults for every setting and
//! validation on load.
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level and dry-run switch
//! - [`StoreConfig`] - grid store endpoint, token, value input mode and retries
//! - [`TemplatesConfig`] - template resource directory and cache
//! - [`LoggingConfig`] - local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [store]
//! base_url = "https://sheets.googleapis.com"
//! access_token = "${SHEETFILL_STORE_TOKEN}"
//! value_input_mode = "user_entered"
//!
//! [store.retry]
//! max_retries = 5
//! initial_delay_ms = 1000
//!
//! [templates]
//! directory = "templates"
//! cache_ttl_seconds = 600
//! validate_anchor = true
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, LoggingConfig, RetryConfig, SheetfillConfig, StoreConfig, TemplatesConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
