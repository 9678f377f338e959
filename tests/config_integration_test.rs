//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold `ENV_MUTEX` so they do
//! not interfere with each other.

use secrecy::ExposeSecret;
use sheetfill::adapters::grid::{RetryPolicy, ValueInputMode};
use sheetfill::config::{load_config, load_config_from_str};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    for name in [
        "SHEETFILL_APPLICATION_LOG_LEVEL",
        "SHEETFILL_APPLICATION_DRY_RUN",
        "SHEETFILL_STORE_BASE_URL",
        "SHEETFILL_STORE_ACCESS_TOKEN",
        "SHEETFILL_STORE_TIMEOUT_SECONDS",
        "SHEETFILL_STORE_VALUE_INPUT_MODE",
        "SHEETFILL_STORE_RETRY_MAX_RETRIES",
        "SHEETFILL_TEMPLATES_DIRECTORY",
        "SHEETFILL_TEMPLATES_CACHE_TTL_SECONDS",
        "SHEETFILL_TEMPLATES_VALIDATE_ANCHOR",
        "SHEETFILL_LOGGING_LOCAL_ENABLED",
        "SHEETFILL_LOGGING_LOCAL_PATH",
        "TEST_SHEETFILL_TOKEN",
    ] {
        std::env::remove_var(name);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const COMPLETE_CONFIG: &str = r#"
[application]
log_level = "debug"
dry_run = true

[store]
base_url = "https://sheets.example.com"
access_token = "${TEST_SHEETFILL_TOKEN}"
timeout_seconds = 30
value_input_mode = "raw"

[store.retry]
max_retries = 4
initial_delay_ms = 200
max_delay_ms = 5000
backoff_multiplier = 3.0
jitter = false

[templates]
directory = "/srv/sheetfill/templates"
cache_ttl_seconds = 120
cache_capacity = 4
validate_anchor = true

[templates.resources]
travel_expenses = "viaticos_v3"

[logging]
local_enabled = false
local_path = "/var/log/sheetfill"
local_rotation = "hourly"
local_max_size_mb = 50
"#;

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_SHEETFILL_TOKEN", "ya29.token");

    let file = write_config(COMPLETE_CONFIG);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);

    assert_eq!(config.store.base_url, "https://sheets.example.com");
    assert_eq!(
        config
            .store
            .access_token
            .as_ref()
            .unwrap()
            .expose_secret()
            .as_str(),
        "ya29.token"
    );
    assert_eq!(config.store.timeout_seconds, 30);
    assert_eq!(config.store.input_mode().unwrap(), ValueInputMode::Raw);

    let policy = RetryPolicy::from(&config.store.retry);
    assert_eq!(policy.max_retries, 4);
    assert_eq!(policy.initial_delay, Duration::from_millis(200));
    assert_eq!(policy.max_delay, Duration::from_millis(5000));
    assert!(!policy.jitter);

    assert_eq!(config.templates.directory, "/srv/sheetfill/templates");
    assert_eq!(config.templates.cache_ttl_seconds, 120);
    assert!(config.templates.validate_anchor);
    assert_eq!(
        config.templates.resources.get("travel_expenses").map(String::as_str),
        Some("viaticos_v3")
    );

    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");

    cleanup_env_vars();
}

#[test]
fn test_empty_config_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let config = load_config_from_str("").unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(!config.application.dry_run);
    assert!(config.store.access_token.is_none());
    assert_eq!(config.store.input_mode().unwrap(), ValueInputMode::UserEntered);
    assert_eq!(config.templates.directory, "templates");
    assert!(!config.templates.validate_anchor);
    assert!(config.logging.local_enabled);
}

#[test]
fn test_missing_file_is_configuration_error() {
    let err = load_config("/nonexistent/sheetfill.toml").unwrap_err();
    assert!(err.to_string().contains("Configuration file not found"));
}

#[test]
fn test_missing_env_var_is_reported() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(COMPLETE_CONFIG);
    let err = load_config(file.path()).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Missing required environment variables"));
    assert!(message.contains("TEST_SHEETFILL_TOKEN"));
}

#[test]
fn test_env_overrides_take_precedence() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_SHEETFILL_TOKEN", "from-file");
    std::env::set_var("SHEETFILL_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("SHEETFILL_STORE_ACCESS_TOKEN", "from-override");
    std::env::set_var("SHEETFILL_STORE_VALUE_INPUT_MODE", "user_entered");
    std::env::set_var("SHEETFILL_STORE_RETRY_MAX_RETRIES", "7");
    std::env::set_var("SHEETFILL_TEMPLATES_DIRECTORY", "/tmp/templates");
    std::env::set_var("SHEETFILL_TEMPLATES_VALIDATE_ANCHOR", "false");
    std::env::set_var("SHEETFILL_LOGGING_LOCAL_PATH", "/tmp/logs");

    let file = write_config(COMPLETE_CONFIG);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(
        config
            .store
            .access_token
            .as_ref()
            .unwrap()
            .expose_secret()
            .as_str(),
        "from-override"
    );
    assert_eq!(config.store.input_mode().unwrap(), ValueInputMode::UserEntered);
    assert_eq!(config.store.retry.max_retries, 7);
    assert_eq!(config.templates.directory, "/tmp/templates");
    assert!(!config.templates.validate_anchor);
    assert_eq!(config.logging.local_path, "/tmp/logs");

    cleanup_env_vars();
}

#[test]
fn test_unparseable_numeric_override_is_ignored() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SHEETFILL_STORE_TIMEOUT_SECONDS", "soon");

    let config = load_config_from_str("[store]\ntimeout_seconds = 15").unwrap();
    assert_eq!(config.store.timeout_seconds, 15);

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_fails_validation() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SHEETFILL_STORE_VALUE_INPUT_MODE", "formula");

    let err = load_config_from_str("").unwrap_err();
    assert!(err.to_string().contains("Configuration validation failed"));

    cleanup_env_vars();
}

#[test]
fn test_validation_rejects_bad_values() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let cases = [
        ("[application]\nlog_level = \"verbose\"", "log_level"),
        ("[store]\nbase_url = \"ftp://sheets\"", "base_url"),
        ("[store]\ntimeout_seconds = 0", "timeout_seconds"),
        ("[store.retry]\nmax_retries = 11", "max_retries"),
        (
            "[store.retry]\ninitial_delay_ms = 500\nmax_delay_ms = 100",
            "max_delay_ms",
        ),
        ("[templates]\ncache_capacity = 0", "cache_capacity"),
        ("[templates.resources]\ninvoice = \"x\"", "templates.resources"),
        ("[logging]\nlocal_rotation = \"weekly\"", "local_rotation"),
    ];

    for (contents, needle) in cases {
        let err = load_config_from_str(contents).unwrap_err();
        assert!(
            err.to_string().contains(needle),
            "expected '{needle}' in error for {contents:?}, got {err}"
        );
    }
}

#[test]
fn test_commented_env_reference_is_not_required() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let config =
        load_config_from_str("[store]\n# access_token = \"${TEST_SHEETFILL_TOKEN}\"\n").unwrap();
    assert!(config.store.access_token.is_none());
}
