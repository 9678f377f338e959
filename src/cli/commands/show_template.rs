//! Show template command implementation
//!
//! Prints the resolved template configuration for a document type.

use crate::config::load_config;
use crate::core::template::{load_template, TemplateRegistry, TemplateSource};
use crate::domain::DocumentType;
use clap::Args;
use std::str::FromStr;

/// Arguments for the show-template command
#[derive(Args, Debug)]
pub struct ShowTemplateArgs {
    /// Document type (travel_expenses, purchase_order)
    #[arg(short = 't', long = "type", value_name = "DOC_TYPE")]
    pub document_type: String,

    /// Print the configuration as JSON
    #[arg(long)]
    pub json: bool,
}

impl ShowTemplateArgs {
    /// Execute the show-template command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let document_type = match DocumentType::from_str(&self.document_type) {
            Ok(document_type) => document_type,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let registry = TemplateRegistry::new(&config.templates);
        let resource_id = registry.resource_id(document_type);
        let (template, source) =
            load_template(&config.templates.directory, document_type, resource_id);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&template)?);
            return Ok(0);
        }

        let origin = match source {
            TemplateSource::Resource => "resource",
            TemplateSource::BuiltInDefault => "built-in default",
        };
        println!("📋 Template for {document_type} ({origin}: {resource_id})");
        println!();
        println!("  Template row: {}", template.template_row_range);
        println!("  Insert anchor row: {}", template.insert_anchor_row);
        println!("  Copy style: {}", template.copy_style);
        println!("  Columns:");
        for (field, spec) in template.columns_in_order() {
            let attribute = template
                .data_mapping
                .get(field)
                .map(String::as_str)
                .unwrap_or(field);
            println!(
                "    {:<16} {:<3} span {:<2} <- {attribute}",
                field, spec.column, spec.span
            );
        }
        Ok(0)
    }
}
