//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "sheetfill.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing sheetfill configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Put SHEETFILL_ACCESS_TOKEN in your environment or a .env file");
                println!("  3. Optionally add template resources under templates/");
                println!("  4. Validate configuration: sheetfill validate-config");
                println!("  5. Preview a run: sheetfill generate --dry-run ...");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# sheetfill configuration

[application]
log_level = "info"
dry_run = false

[store]
base_url = "https://sheets.googleapis.com"
access_token = "${SHEETFILL_ACCESS_TOKEN}"
value_input_mode = "user_entered"

[templates]
directory = "templates"

[logging]
local_enabled = true
local_path = "./logs"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# sheetfill configuration
#
# Values of the form ${VAR} are read from the environment (or .env).
# Any key can also be overridden with SHEETFILL_<SECTION>_<KEY>,
# e.g. SHEETFILL_STORE_TIMEOUT_SECONDS=30.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (print the insertion plan and mapped rows, never touch the store)
dry_run = false

# ============================================================================
# Grid Document Store
# ============================================================================
[store]
# Base URL of the spreadsheet REST API
base_url = "https://sheets.googleapis.com"

# Bearer token (use environment variable)
access_token = "${SHEETFILL_ACCESS_TOKEN}"

# Request timeout in seconds
timeout_seconds = 60

# How written values are interpreted: "raw" or "user_entered"
# - raw: stored verbatim as text
# - user_entered: parsed like typed input (numbers, dates, currency)
value_input_mode = "user_entered"

# Retries on rate-limit responses only (capped exponential backoff)
[store.retry]
max_retries = 5
initial_delay_ms = 1000
max_delay_ms = 32000
backoff_multiplier = 2.0
jitter = true

# ============================================================================
# Template Resources
# ============================================================================
[templates]
# Directory holding <resource_id>.json or <resource_id>.toml
directory = "templates"

# Loaded configurations are reused for this long
cache_ttl_seconds = 600

# Maximum number of cached configurations
cache_capacity = 16

# Check the declared template row against the live sheet before inserting rows
validate_anchor = false

# Optional resource id overrides per document type
[templates.resources]
# travel_expenses = "travel_expenses_v2"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = true

# Local log directory
local_path = "./logs"

# Log rotation (daily or hourly)
local_rotation = "daily"

# Maximum log file size in MB
local_max_size_mb = 100
"#
        .to_string()
    }
}
