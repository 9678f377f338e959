//! Substitute command implementation
//!
//! Runs only the placeholder pass over a grid document.

use super::connect_store;
use crate::config::load_config;
use crate::core::placeholder::{DocumentTarget, PlaceholderEngine, PlaceholderValues};
use crate::core::report::ReportInput;
use crate::domain::{DocumentId, SheetName};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the substitute command
#[derive(Args, Debug)]
pub struct SubstituteArgs {
    /// Document to fill
    #[arg(short, long)]
    pub document: String,

    /// JSON file with a `placeholders` object
    #[arg(short, long)]
    pub input: PathBuf,

    /// Sheet to scan (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
}

impl SubstituteArgs {
    /// Execute the substitute command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let document = match DocumentId::new(&self.document) {
            Ok(document) => document,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };
        let sheet = match self.sheet.as_deref().map(SheetName::new).transpose() {
            Ok(sheet) => sheet,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let values = match ReportInput::from_path(&self.input) {
            Ok(input) => PlaceholderValues::from(input.placeholders),
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(5);
            }
        };

        let store = match connect_store(&config) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("❌ Failed to set up grid store: {e}");
                return Ok(2);
            }
        };

        let target = DocumentTarget::Grid {
            store,
            document,
            sheet,
            value_input_mode: config.store.input_mode()?,
        };

        match PlaceholderEngine::new().try_substitute(&target, &values).await {
            Ok(outcome) => {
                println!(
                    "✅ {} placeholders replaced in {} cells",
                    outcome.tokens_replaced, outcome.cells_updated
                );
                if !outcome.unresolved.is_empty() {
                    let keys: Vec<&str> = outcome.unresolved.iter().map(String::as_str).collect();
                    println!("   Unresolved (left empty): {}", keys.join(", "));
                }
                Ok(0)
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Placeholder substitution failed");
                println!("❌ Placeholder substitution failed");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }
}
