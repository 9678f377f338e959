//! Report generation workflow
//!
//! Wires template selection, placeholder substitution and row
//! materialization for one document.

use crate::adapters::grid::{GridStore, ValueInputMode};
use crate::config::SheetfillConfig;
use crate::core::materializer::{
    validate_template_anchor, MaterializationSummary, RowMaterializer,
};
use crate::core::placeholder::{
    DocumentTarget, PlaceholderEngine, PlaceholderValues, SubstitutionOutcome,
};
use crate::core::template::TemplateRegistry;
use crate::domain::{DocumentId, DocumentType, Record, Result, SheetName, SheetfillError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Input file of the `generate` and `substitute` commands
///
/// ```json
/// { "placeholders": { "nombre": "Ana" }, "records": [ { "id": "8.1" } ] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportInput {
    #[serde(default)]
    pub placeholders: Map<String, Value>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl ReportInput {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SheetfillError::Io(format!("Failed to read input {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// One document to generate
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub document: DocumentId,
    pub document_type: DocumentType,
    /// Sheet holding the template; the first sheet when `None`
    pub sheet: Option<SheetName>,
    pub placeholders: PlaceholderValues,
    /// Dynamic records only, already filtered upstream
    pub records: Vec<Record>,
}

impl ReportRequest {
    pub fn new(document: DocumentId, document_type: DocumentType) -> Self {
        Self {
            document,
            document_type,
            sheet: None,
            placeholders: PlaceholderValues::new(),
            records: Vec::new(),
        }
    }

    pub fn with_sheet(mut self, sheet: SheetName) -> Self {
        self.sheet = Some(sheet);
        self
    }

    pub fn with_input(mut self, input: ReportInput) -> Self {
        self.placeholders = PlaceholderValues::from(input.placeholders);
        self.records = input.records;
        self
    }
}

/// A completed document
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
    pub document: DocumentId,
    pub document_type: DocumentType,
    pub substitution: SubstitutionOutcome,
    pub materialization: MaterializationSummary,
    pub generated_at: DateTime<Utc>,
}

/// Generates reports against one grid store
pub struct ReportOrchestrator {
    store: Arc<dyn GridStore>,
    registry: Arc<TemplateRegistry>,
    engine: PlaceholderEngine,
    materializer: RowMaterializer,
    value_input_mode: ValueInputMode,
    validate_anchor: bool,
}

impl ReportOrchestrator {
    pub fn new(store: Arc<dyn GridStore>, registry: Arc<TemplateRegistry>) -> Self {
        Self {
            materializer: RowMaterializer::new(store.clone()),
            store,
            registry,
            engine: PlaceholderEngine::new(),
            value_input_mode: ValueInputMode::default(),
            validate_anchor: false,
        }
    }

    /// Orchestrator configured from the `[store]` and `[templates]` sections
    pub fn from_config(
        config: &SheetfillConfig,
        store: Arc<dyn GridStore>,
        registry: Arc<TemplateRegistry>,
    ) -> Result<Self> {
        Ok(Self::new(store, registry)
            .with_value_input_mode(config.store.input_mode()?)
            .with_anchor_validation(config.templates.validate_anchor))
    }

    pub fn with_value_input_mode(mut self, mode: ValueInputMode) -> Self {
        self.value_input_mode = mode;
        self.materializer = self.materializer.with_value_input_mode(mode);
        self
    }

    pub fn with_anchor_validation(mut self, enabled: bool) -> Self {
        self.validate_anchor = enabled;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Generates one document
    ///
    /// Loads the template for the request's document type, optionally checks
    /// the anchor, substitutes placeholders and materializes the rows.
    /// Placeholder problems only degrade the outcome; a materializer failure
    /// is returned with the stage it reached.
    ///
    /// # Arguments
    ///
    /// * `request` - Document, document type and input data
    ///
    /// # Errors
    ///
    /// Returns [`SheetfillError::Validation`] when the anchor check finds the
    /// template row outside the sheet, and the materializer's error otherwise.
    pub async fn generate(&self, request: ReportRequest) -> Result<ReportOutcome> {
        tracing::info!(
            document_id = %request.document,
            document_type = %request.document_type,
            records = request.records.len(),
            placeholders = request.placeholders.len(),
            "Generating report"
        );

        let config = self.registry.load(request.document_type);

        if self.validate_anchor {
            match validate_template_anchor(
                self.store.as_ref(),
                &request.document,
                request.sheet.as_ref(),
                &config,
            )
            .await
            {
                Ok(report) => tracing::debug!(
                    document_id = %request.document,
                    merges_on_row = report.merges_on_row,
                    non_empty_cells = report.non_empty_cells,
                    "Template anchor checked"
                ),
                Err(e @ SheetfillError::Validation(_)) => return Err(e),
                Err(e) => tracing::warn!(
                    document_id = %request.document,
                    error = %e,
                    "Template anchor check skipped"
                ),
            }
        }

        let substitution = self
            .substitute_grid(&request.document, request.sheet.clone(), &request.placeholders)
            .await;

        let materialization = self
            .materializer
            .materialize(
                &request.document,
                request.sheet.as_ref(),
                &config,
                &request.records,
            )
            .await?;

        Ok(ReportOutcome {
            document: request.document,
            document_type: request.document_type,
            substitution,
            materialization,
            generated_at: Utc::now(),
        })
    }

    /// Placeholder pass alone; an empty value map leaves the document untouched
    pub async fn substitute_grid(
        &self,
        document: &DocumentId,
        sheet: Option<SheetName>,
        values: &PlaceholderValues,
    ) -> SubstitutionOutcome {
        if values.is_empty() {
            return SubstitutionOutcome::default();
        }
        let target = DocumentTarget::Grid {
            store: self.store.clone(),
            document: document.clone(),
            sheet,
            value_input_mode: self.value_input_mode,
        };
        self.engine.substitute(&target, values).await
    }
}
