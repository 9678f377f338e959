//! Row materializer
//!
//! Grows a template by one row per record in three strictly sequential
//! stages: bulk row insertion, template-row style and merge replication,
//! then lead-cell data writes. Each stage re-reads the live sheet structure
//! it needs; nothing is cached between stages.
//!
//! A failure is never rolled back. If the row insert already landed, the run
//! reports [`SheetfillError::PartialFailure`] with the stage reached.

use super::plan::{plan, InsertionPlan};
use super::summary::MaterializationSummary;
use crate::adapters::grid::{GridRequest, GridStore, SheetMetadata, ValueInputMode, ValueRange};
use crate::core::coordinates::{CellRange, GridRange};
use crate::core::mapper::RecordMapper;
use crate::core::template::TemplateConfig;
use crate::domain::{
    DocumentId, MaterializationStage, MaterializationStep, Record, Result, SheetName,
    SheetfillError,
};
use crate::{log_error_with_context, log_stage_complete, log_stage_start};
use std::sync::Arc;
use std::time::Instant;

/// Drives one materialization run against a grid store
#[derive(Clone)]
pub struct RowMaterializer {
    store: Arc<dyn GridStore>,
    value_input_mode: ValueInputMode,
}

impl RowMaterializer {
    pub fn new(store: Arc<dyn GridStore>) -> Self {
        Self {
            store,
            value_input_mode: ValueInputMode::default(),
        }
    }

    pub fn with_value_input_mode(mut self, mode: ValueInputMode) -> Self {
        self.value_input_mode = mode;
        self
    }

    pub fn value_input_mode(&self) -> ValueInputMode {
        self.value_input_mode
    }

    /// Inserts `plan.row_count` empty rows at the anchor in one request
    ///
    /// New rows inherit formatting from the row above. Not idempotent:
    /// calling this twice inserts the block twice.
    pub async fn insert_empty_rows(
        &self,
        document: &DocumentId,
        sheet: Option<&SheetName>,
        plan: &InsertionPlan,
    ) -> Result<usize> {
        if plan.is_empty() {
            return Ok(0);
        }

        let metadata = self.store.sheet_metadata(document, sheet).await?;
        if plan.anchor_row == 0 || plan.anchor_index() > metadata.row_count {
            return Err(SheetfillError::Validation(format!(
                "anchor row {} is outside sheet '{}' ({} rows)",
                plan.anchor_row, metadata.title, metadata.row_count
            )));
        }

        let request = GridRequest::InsertRows {
            sheet_id: metadata.sheet_id,
            start_index: plan.anchor_index(),
            count: plan.row_count,
            inherit_from_before: true,
        };
        self.store.batch_update(document, &[request]).await?;
        Ok(plan.row_count as usize)
    }

    /// Replicates the template row's formatting and merges onto the new rows
    ///
    /// Must run after [`Self::insert_empty_rows`]: the template row is looked
    /// up at its post-insert position. Only merges covering the template row
    /// and intersecting its column span are replicated, each as a single-row
    /// merge over the same columns. Everything goes out in one batch.
    /// Returns the number of merges created; a config with `copy_style`
    /// disabled makes no store calls.
    pub async fn copy_template_row_styles(
        &self,
        document: &DocumentId,
        sheet: Option<&SheetName>,
        config: &TemplateConfig,
        plan: &InsertionPlan,
    ) -> Result<usize> {
        if plan.is_empty() || !config.copy_style {
            return Ok(0);
        }

        let metadata = self.store.sheet_metadata(document, sheet).await?;
        let live_row = plan.live_template_row(&config.template_row_range);
        let template = template_grid_range(&config.template_row_range, live_row, &metadata);
        let merges = template_merges(&metadata, &template);

        tracing::debug!(
            document_id = %document,
            template_row = live_row,
            template_merges = merges.len(),
            "Replicating template row"
        );

        let mut requests = Vec::with_capacity(plan.row_count as usize * (merges.len() + 1));
        for row_index in plan.row_indices() {
            requests.push(GridRequest::CopyFormat {
                source: template,
                destination: template.on_row(row_index),
            });
            requests.extend(merges.iter().map(|merge| GridRequest::MergeCells {
                range: merge.on_row(row_index),
            }));
        }

        self.store.batch_update(document, &requests).await?;
        Ok(merges.len() * plan.row_count as usize)
    }

    /// Writes each record's fields to the lead cells of its row
    ///
    /// Record `i` lands on row `anchor_row + i`. Every declared column is
    /// written, so re-running with the same records over the same rows
    /// yields the same cells and the same write count.
    pub async fn write_record_data(
        &self,
        document: &DocumentId,
        sheet: Option<&SheetName>,
        records: &[Record],
        config: &TemplateConfig,
        anchor_row: u32,
    ) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let updates = record_updates(records, config, anchor_row, sheet);
        self.store
            .batch_update_values(document, &updates, self.value_input_mode)
            .await
    }

    /// Runs all stages in order
    ///
    /// Inserts one row per record at the anchor, copies the template row's
    /// formatting and merges onto the new rows, then writes the record values.
    /// Must run at most once per document instance. Zero records make no
    /// store calls and finish at [`MaterializationStage::Done`].
    ///
    /// # Arguments
    ///
    /// * `document` - Target spreadsheet
    /// * `sheet` - Sheet to fill; `None` uses the first sheet
    /// * `config` - Template layout for the document type
    /// * `records` - Line items, one row each, in order
    ///
    /// # Returns
    ///
    /// A [`MaterializationSummary`] with the counts and elapsed time.
    ///
    /// # Errors
    ///
    /// - [`SheetfillError::Materialization`] when row insertion fails; the
    ///   document is unchanged
    /// - [`SheetfillError::PartialFailure`] when a later stage fails; rows
    ///   already inserted stay in place and the error names the stage reached
    pub async fn materialize(
        &self,
        document: &DocumentId,
        sheet: Option<&SheetName>,
        config: &TemplateConfig,
        records: &[Record],
    ) -> Result<MaterializationSummary> {
        let started = Instant::now();
        let plan = plan(records, config);
        let mut summary = MaterializationSummary::new(document.clone(), plan);

        if plan.is_empty() {
            tracing::info!(document_id = %document, "No records to materialize");
            summary.stage = MaterializationStage::Done;
            return Ok(summary.with_duration(started.elapsed()));
        }

        let step = MaterializationStep::InsertRows;
        log_stage_start!(document, step, plan.row_count);
        let stage_started = Instant::now();
        summary.rows_inserted = self
            .insert_empty_rows(document, sheet, &plan)
            .await
            .map_err(|e| stage_failure(document, summary.stage, step, e))?;
        summary.stage = summary.stage.next();
        log_stage_complete!(document, summary.stage, stage_started.elapsed());

        let step = MaterializationStep::CopyStyles;
        log_stage_start!(document, step, plan.row_count);
        let stage_started = Instant::now();
        summary.merges_created = self
            .copy_template_row_styles(document, sheet, config, &plan)
            .await
            .map_err(|e| stage_failure(document, summary.stage, step, e))?;
        summary.stage = summary.stage.next();
        log_stage_complete!(document, summary.stage, stage_started.elapsed());

        let step = MaterializationStep::WriteData;
        log_stage_start!(document, step, plan.row_count);
        let stage_started = Instant::now();
        summary.cells_written = self
            .write_record_data(document, sheet, records, config, plan.anchor_row)
            .await
            .map_err(|e| stage_failure(document, summary.stage, step, e))?;
        summary.stage = summary.stage.next();
        log_stage_complete!(document, summary.stage, stage_started.elapsed());

        summary.stage = summary.stage.next();
        let summary = summary.with_duration(started.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}

/// Lead-cell writes for every record and declared column
pub fn record_updates(
    records: &[Record],
    config: &TemplateConfig,
    anchor_row: u32,
    sheet: Option<&SheetName>,
) -> Vec<ValueRange> {
    let mapper = RecordMapper::new(config);
    let prefix = sheet.map(SheetName::a1_prefix).unwrap_or_default();
    let columns = config.columns_in_order();

    let mut updates = Vec::with_capacity(records.len() * columns.len());
    for (offset, record) in records.iter().enumerate() {
        let row = anchor_row + offset as u32;
        for (field, spec) in &columns {
            updates.push(ValueRange::cell(
                format!("{prefix}{}{row}", spec.column),
                mapper.field_value(field, record),
            ));
        }
    }
    updates
}

fn template_grid_range(template: &CellRange, live_row: u32, metadata: &SheetMetadata) -> GridRange {
    CellRange::row_span(
        template.start_column_index(),
        template.end_column_index(),
        live_row,
    )
    .to_grid_range(metadata.sheet_id)
}

fn template_merges(metadata: &SheetMetadata, template: &GridRange) -> Vec<GridRange> {
    metadata
        .merges_on_row(template.start_row_index)
        .filter(|merge| {
            merge.intersects_columns(template.start_column_index, template.end_column_index)
        })
        .copied()
        .collect()
}

fn stage_failure(
    document: &DocumentId,
    reached: MaterializationStage,
    step: MaterializationStep,
    source: SheetfillError,
) -> SheetfillError {
    let error = if reached.has_committed() {
        SheetfillError::PartialFailure {
            reached,
            step,
            source: Box::new(source),
        }
    } else {
        SheetfillError::Materialization {
            step,
            source: Box::new(source),
        }
    };
    log_error_with_context!(
        &error,
        format!("document {document}: stage {reached} reached").as_str()
    );
    error
}

/// What the anchor check found on the live template row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAnchorReport {
    pub sheet_title: SheetName,
    /// 1-based template row as declared in the config
    pub template_row: u32,
    pub sheet_row_count: u32,
    /// Merges on the template row within its column span
    pub merges_on_row: usize,
    /// Cells holding text on the template row
    pub non_empty_cells: usize,
}

impl TemplateAnchorReport {
    /// A template row with neither merges nor text is probably not the real one
    pub fn looks_like_template(&self) -> bool {
        self.merges_on_row > 0 || self.non_empty_cells > 0
    }
}

/// Checks the declared template row against a freshly duplicated document
///
/// Fails with [`SheetfillError::Validation`] when the declared row or its
/// columns lie outside the sheet.
pub async fn validate_template_anchor(
    store: &dyn GridStore,
    document: &DocumentId,
    sheet: Option<&SheetName>,
    config: &TemplateConfig,
) -> Result<TemplateAnchorReport> {
    let metadata = store.sheet_metadata(document, sheet).await?;
    let declared = &config.template_row_range;

    if declared.start_row() > metadata.row_count
        || declared.end_column_index() >= metadata.column_count
    {
        return Err(SheetfillError::Validation(format!(
            "template row {declared} of {} is outside sheet '{}' ({} rows x {} columns)",
            config.document_type, metadata.title, metadata.row_count, metadata.column_count
        )));
    }

    let template = template_grid_range(declared, declared.start_row(), &metadata);
    let merges_on_row = template_merges(&metadata, &template).len();
    let values = store
        .get_values(document, &declared.to_a1(Some(&metadata.title)))
        .await?;
    let non_empty_cells = values
        .iter()
        .flatten()
        .filter(|cell| !cell.trim().is_empty())
        .count();

    let report = TemplateAnchorReport {
        sheet_title: metadata.title,
        template_row: declared.start_row(),
        sheet_row_count: metadata.row_count,
        merges_on_row,
        non_empty_cells,
    };

    if !report.looks_like_template() {
        tracing::warn!(
            document_id = %document,
            template_row = report.template_row,
            "Declared template row has no merges and no text"
        );
    }
    Ok(report)
}
