//! Core logic for sheetfill.
//!
//! # Modules
//!
//! - [`coordinates`] - A1 column letters, ranges and 0-based grid ranges
//! - [`cache`] - TTL cache with an injected clock
//! - [`template`] - per-document-type template row layout
//! - [`mapper`] - records to template-shaped rows
//! - [`placeholder`] - `{{key}}` substitution over grid and flowed documents
//! - [`materializer`] - staged row insertion, style replication and data writes
//! - [`report`] - the end-to-end generation workflow
//!
//! # Generation Workflow
//!
//! 1. **Template**: load the document type's configuration (cached, falls back to defaults)
//! 2. **Check** (optional): confirm the declared template row exists in the live sheet
//! 3. **Substitute**: resolve `{{key}}` tokens in one read and one batched write
//! 4. **Insert**: add one empty row per record at the fixed anchor, in one request
//! 5. **Style**: replicate the template row's formatting and merges onto the new rows
//! 6. **Write**: fill each new row's lead cells from its record
//!
//! # Example
//!
//! ```rust,no_run
//! use sheetfill::adapters::grid::{HttpGridStore, RetryingGridStore, RetryPolicy};
//! use sheetfill::config::load_config;
//! use sheetfill::core::report::{ReportInput, ReportOrchestrator, ReportRequest};
//! use sheetfill::core::template::TemplateRegistry;
//! use sheetfill::domain::{DocumentId, DocumentType};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sheetfill.toml")?;
//! let store = RetryingGridStore::new(
//!     HttpGridStore::new(&config.store)?,
//!     RetryPolicy::from(&config.store.retry),
//! );
//! let registry = Arc::new(TemplateRegistry::new(&config.templates));
//! let orchestrator = ReportOrchestrator::from_config(&config, Arc::new(store), registry)?;
//!
//! let request = ReportRequest::new(DocumentId::new("1AbC")?, DocumentType::TravelExpenses)
//!     .with_input(ReportInput::from_path("input.json")?);
//! let outcome = orchestrator.generate(request).await?;
//!
//! println!("Rows inserted: {}", outcome.materialization.rows_inserted);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod coordinates;
pub mod mapper;
pub mod materializer;
pub mod placeholder;
pub mod report;
pub mod template;
