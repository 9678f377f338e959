//! Generate command implementation
//!
//! This module implements the `generate` command: placeholder substitution
//! followed by row materialization on one document.

use super::connect_store;
use crate::config::load_config;
use crate::core::mapper::RecordMapper;
use crate::core::materializer::plan;
use crate::core::report::{ReportInput, ReportOrchestrator, ReportRequest};
use crate::core::template::{TemplateConfig, TemplateRegistry};
use crate::domain::{DocumentId, DocumentType, SheetName};
use clap::Args;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Document to fill (a fresh copy of the template)
    #[arg(short, long)]
    pub document: String,

    /// Document type (travel_expenses, purchase_order)
    #[arg(short = 't', long = "type", value_name = "DOC_TYPE")]
    pub document_type: String,

    /// JSON file with `placeholders` and `records`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Sheet holding the template row (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Dry run mode - print the insertion plan and mapped rows without touching the store
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    /// Execute the generate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(document = %self.document, "Starting generate command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Configuration loading failed");
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let (document, document_type, sheet) = match self.parse_targets() {
            Ok(targets) => targets,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let input = match ReportInput::from_path(&self.input) {
            Ok(input) => input,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read input");
                eprintln!("❌ {e}");
                return Ok(5);
            }
        };

        let registry = Arc::new(TemplateRegistry::new(&config.templates));

        if self.dry_run || config.application.dry_run {
            tracing::info!("Dry run mode enabled - no store calls will be made");
            let template = registry.load(document_type);
            print_dry_run(&template, &input);
            return Ok(0);
        }

        let store = match connect_store(&config) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("❌ Failed to set up grid store: {e}");
                return Ok(2);
            }
        };
        let orchestrator = ReportOrchestrator::from_config(&config, store, registry)?;

        let mut request = ReportRequest::new(document, document_type).with_input(input);
        if let Some(sheet) = sheet {
            request = request.with_sheet(sheet);
        }

        println!("🚀 Generating {} report...", document_type);
        match orchestrator.generate(request).await {
            Ok(outcome) => {
                let summary = &outcome.materialization;
                println!("✅ Report generated: {}", outcome.document);
                println!();
                match &outcome.substitution.degraded {
                    Some(reason) => println!("  ⚠️  Placeholders skipped: {reason}"),
                    None => println!(
                        "  Placeholders: {} replaced in {} cells",
                        outcome.substitution.tokens_replaced, outcome.substitution.cells_updated
                    ),
                }
                println!("  Anchor row: {}", summary.plan.anchor_row);
                println!("  Rows inserted: {}", summary.rows_inserted);
                println!("  Merges created: {}", summary.merges_created);
                println!("  Cells written: {}", summary.cells_written);
                println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
                println!("  Generated at: {}", outcome.generated_at.to_rfc3339());
                Ok(0)
            }
            Err(e) => {
                let committed = e.stage_reached().is_some_and(|stage| stage.has_committed());
                crate::log_error_with_context!(&e, "Report generation failed");
                if committed {
                    println!("❌ Report generation partially failed");
                    println!("   Error: {e}");
                    println!("   Inserted rows were left in place; do not rerun on this document");
                    Ok(3)
                } else {
                    println!("❌ Report generation failed");
                    println!("   Error: {e}");
                    Ok(5)
                }
            }
        }
    }

    fn parse_targets(&self) -> Result<(DocumentId, DocumentType, Option<SheetName>), String> {
        let document = DocumentId::new(&self.document)?;
        let document_type = DocumentType::from_str(&self.document_type)?;
        let sheet = self.sheet.as_deref().map(SheetName::new).transpose()?;
        Ok((document, document_type, sheet))
    }
}

fn print_dry_run(template: &TemplateConfig, input: &ReportInput) {
    let plan = plan(&input.records, template);
    let mapper = RecordMapper::new(template);

    println!("🔍 DRY RUN MODE - No changes will be made to the document");
    println!();
    println!("  Document type: {}", template.document_type);
    println!("  Template row: {}", template.template_row_range);
    println!("  Copy style: {}", template.copy_style);
    println!("  Placeholders: {}", input.placeholders.len());
    println!(
        "  Insertion plan: {} rows at row {}",
        plan.row_count, plan.anchor_row
    );
    println!();
    for (row, values) in plan.row_numbers().zip(mapper.create_rows(&input.records)) {
        println!("  {row}: {}", values.join(" | "));
    }
}
