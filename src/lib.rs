// sheetfill - Spreadsheet Template Filling Tool
// Copyright (c) 2025 sheetfill Contributors
// Licensed under the MIT License

//! # sheetfill - Spreadsheet Template Filling
//!
//! sheetfill materializes filled spreadsheet documents from structured
//! records. A document starts as a fresh copy of a known template; sheetfill
//! then:
//!
//! - **Substitutes** `{{key}}` placeholder tokens from a key/value map
//! - **Inserts** one row per record at the document type's fixed anchor row
//! - **Replicates** the template row's formatting and merged cells onto the new rows
//! - **Writes** each record's fields into the lead cells of its row
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Coordinates, templates, mapping, placeholders, materialization
//! - [`adapters`] - Grid and flowed-text document stores
//! - [`domain`] - Identifiers, records and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust
//! use sheetfill::adapters::grid::{CellFormat, InMemoryGridStore, MemorySheet};
//! use sheetfill::core::materializer::RowMaterializer;
//! use sheetfill::core::template::default_config;
//! use sheetfill::domain::{DocumentId, DocumentType, Record};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = DocumentId::new("expenses-2025-03")?;
//! let store = Arc::new(InMemoryGridStore::new());
//! store.add_document(
//!     document.clone(),
//!     vec![MemorySheet::new(0, "Hoja 1", 60, 30)
//!         .with_format("E45:AB45", CellFormat::new("bordered"))?
//!         .with_merge("F45:V45")?],
//! );
//!
//! let records = vec![
//!     Record::new().with("id", "8.1").with("descripcion", "Viáticos").with("cantidad", 3),
//! ];
//! let config = default_config(DocumentType::TravelExpenses);
//! let summary = RowMaterializer::new(store.clone())
//!     .materialize(&document, None, &config, &records)
//!     .await?;
//!
//! assert_eq!(summary.rows_inserted, 1);
//! assert_eq!(summary.merges_created, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! sheetfill uses the [`domain::SheetfillError`] type for all errors. A
//! materializer failure carries the stage it reached:
//!
//! ```rust
//! use sheetfill::domain::{MaterializationStage, SheetfillError};
//!
//! fn must_not_rerun(error: &SheetfillError) -> bool {
//!     error
//!         .stage_reached()
//!         .is_some_and(MaterializationStage::has_committed)
//! }
//! ```
//!
//! ## Logging
//!
//! sheetfill uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(document_id = "1AbC", rows = 3, "Generating report");
//! warn!(document_type = "travel_expenses", "Template resource unavailable, using built-in default");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
