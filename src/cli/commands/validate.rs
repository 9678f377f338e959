//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the sheetfill configuration file.

use crate::config::load_config;
use crate::core::template::{load_template, TemplateRegistry, TemplateSource};
use crate::domain::DocumentType;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading already runs validation
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let token = match &config.store.access_token {
            Some(token) if !token.expose_secret().is_empty() => "set",
            _ => "not set",
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Store URL: {}", config.store.base_url);
        println!("  Access Token: {token}");
        println!("  Value Input Mode: {}", config.store.value_input_mode);
        println!("  Max Retries: {}", config.store.retry.max_retries);
        println!("  Templates Directory: {}", config.templates.directory);
        println!("  Template Cache TTL: {}s", config.templates.cache_ttl_seconds);
        println!("  Validate Anchor: {}", config.templates.validate_anchor);

        let registry = TemplateRegistry::new(&config.templates);
        println!();
        println!("Templates:");
        for document_type in DocumentType::ALL {
            let resource_id = registry.resource_id(document_type);
            let (_, source) = load_template(&config.templates.directory, document_type, resource_id);
            let origin = match source {
                TemplateSource::Resource => "resource",
                TemplateSource::BuiltInDefault => "built-in default",
            };
            println!("  {document_type}: {resource_id} ({origin})");
        }
        println!();
        Ok(0)
    }
}
