//! In-process grid store
//!
//! Behaves like the remote store for everything the materializer relies on:
//! row insertion shifts values, formats and merges and inherits formatting
//! from a neighbouring row; format copies tile the source over the
//! destination; merges reject overlaps; value writes into a merge are only
//! accepted at its lead cell. Batch updates are atomic.
//!
//! Also carries call counters and one-shot fault injection for tests.

use super::traits::{GridRequest, GridStore, SheetMetadata, ValueInputMode, ValueRange};
use crate::core::coordinates::{parse_cell, parse_reference, split_sheet_prefix, GridRange};
use crate::domain::{DocumentId, GridStoreError, Result, SheetName, SheetfillError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Opaque cell formatting (number format, font, borders...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellFormat(pub String);

impl CellFormat {
    pub fn new(style: impl Into<String>) -> Self {
        Self(style.into())
    }
}

/// One sheet held in memory; cells are keyed by 0-based (row, column)
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySheet {
    sheet_id: i64,
    title: String,
    row_count: u32,
    column_count: u32,
    values: BTreeMap<(u32, u32), String>,
    formats: BTreeMap<(u32, u32), CellFormat>,
    merges: Vec<GridRange>,
}

impl MemorySheet {
    pub fn new(sheet_id: i64, title: impl Into<String>, row_count: u32, column_count: u32) -> Self {
        Self {
            sheet_id,
            title: title.into(),
            row_count,
            column_count,
            values: BTreeMap::new(),
            formats: BTreeMap::new(),
            merges: Vec::new(),
        }
    }

    /// Sets a cell value by A1 address, e.g. `"B3"`
    pub fn with_value(mut self, cell: &str, value: impl Into<String>) -> Result<Self> {
        let (column, row) = parse_cell(cell)?;
        self.check_bounds(row - 1, column)?;
        self.values.insert((row - 1, column), value.into());
        Ok(self)
    }

    /// Applies a format to every cell of an A1 range
    pub fn with_format(mut self, range: &str, format: CellFormat) -> Result<Self> {
        let grid = parse_reference(range)?.to_grid_range(self.sheet_id);
        self.check_range(&grid)?;
        for cell in cells_of(&grid) {
            self.formats.insert(cell, format.clone());
        }
        Ok(self)
    }

    /// Declares a merge over an A1 range
    pub fn with_merge(mut self, range: &str) -> Result<Self> {
        let grid = parse_reference(range)?.to_grid_range(self.sheet_id);
        self.merge(grid)?;
        Ok(self)
    }

    pub fn sheet_id(&self) -> i64 {
        self.sheet_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    pub fn column_count(&self) -> u32 {
        self.column_count
    }

    pub fn merges(&self) -> &[GridRange] {
        &self.merges
    }

    /// Value at an A1 address; `None` when the cell is empty or invalid
    pub fn value_at(&self, cell: &str) -> Option<&str> {
        let (column, row) = parse_cell(cell).ok()?;
        self.values.get(&(row - 1, column)).map(String::as_str)
    }

    /// Format at an A1 address
    pub fn format_at(&self, cell: &str) -> Option<&CellFormat> {
        let (column, row) = parse_cell(cell).ok()?;
        self.formats.get(&(row - 1, column))
    }

    fn metadata(&self) -> Result<SheetMetadata> {
        Ok(SheetMetadata {
            sheet_id: self.sheet_id,
            title: SheetName::new(&self.title).map_err(SheetfillError::Validation)?,
            row_count: self.row_count,
            column_count: self.column_count,
            merges: self.merges.clone(),
        })
    }

    fn check_bounds(&self, row: u32, column: u32) -> Result<()> {
        if row >= self.row_count || column >= self.column_count {
            return Err(invalid(format!(
                "cell ({row}, {column}) exceeds grid limits of sheet '{}' ({} rows x {} columns)",
                self.title, self.row_count, self.column_count
            )));
        }
        Ok(())
    }

    fn check_range(&self, range: &GridRange) -> Result<()> {
        if range.row_count() == 0 || range.column_count() == 0 {
            return Err(invalid(format!("empty range {range:?}")));
        }
        if range.sheet_id != self.sheet_id {
            return Err(invalid(format!(
                "range targets sheet {} but was applied to sheet {}",
                range.sheet_id, self.sheet_id
            )));
        }
        self.check_bounds(range.end_row_index - 1, range.end_column_index - 1)
    }

    fn insert_rows(&mut self, start: u32, count: u32, inherit_from_before: bool) -> Result<()> {
        if start > self.row_count {
            return Err(invalid(format!(
                "insert index {start} exceeds row count {} of sheet '{}'",
                self.row_count, self.title
            )));
        }
        if count == 0 {
            return Ok(());
        }

        let old_row_count = self.row_count;
        self.values = shift_rows(std::mem::take(&mut self.values), start, count);
        self.formats = shift_rows(std::mem::take(&mut self.formats), start, count);

        let source_row = if inherit_from_before {
            start.checked_sub(1)
        } else if start < old_row_count {
            Some(start + count)
        } else {
            None
        };
        if let Some(source_row) = source_row {
            let inherited: Vec<(u32, CellFormat)> = self
                .formats
                .range((source_row, 0)..(source_row + 1, 0))
                .map(|(&(_, column), format)| (column, format.clone()))
                .collect();
            for row in start..start + count {
                for (column, format) in &inherited {
                    self.formats.insert((row, *column), format.clone());
                }
            }
        }

        for merge in &mut self.merges {
            if merge.start_row_index >= start {
                merge.start_row_index += count;
                merge.end_row_index += count;
            } else if merge.end_row_index > start {
                merge.end_row_index += count;
            }
        }

        self.row_count += count;
        Ok(())
    }

    fn copy_format(&mut self, source: &GridRange, destination: &GridRange) -> Result<()> {
        self.check_range(source)?;
        self.check_range(destination)?;

        let snapshot: Vec<((u32, u32), Option<CellFormat>)> = cells_of(destination)
            .map(|(row, column)| {
                let source_row = source.start_row_index
                    + (row - destination.start_row_index) % source.row_count();
                let source_column = source.start_column_index
                    + (column - destination.start_column_index) % source.column_count();
                (
                    (row, column),
                    self.formats.get(&(source_row, source_column)).cloned(),
                )
            })
            .collect();

        for (cell, format) in snapshot {
            match format {
                Some(format) => self.formats.insert(cell, format),
                None => self.formats.remove(&cell),
            };
        }
        Ok(())
    }

    fn merge(&mut self, range: GridRange) -> Result<()> {
        self.check_range(&range)?;
        if let Some(existing) = self.merges.iter().find(|m| m.overlaps(&range)) {
            return Err(invalid(format!(
                "merge {range:?} overlaps existing merge {existing:?}"
            )));
        }
        let lead = (range.start_row_index, range.start_column_index);
        for cell in cells_of(&range) {
            if cell != lead {
                self.values.remove(&cell);
            }
        }
        self.merges.push(range);
        Ok(())
    }

    fn covering_merge(&self, row: u32, column: u32) -> Option<&GridRange> {
        self.merges.iter().find(|m| {
            m.contains_row(row) && m.start_column_index <= column && column < m.end_column_index
        })
    }

    fn write(&mut self, start_row: u32, start_column: u32, rows: &[Vec<String>]) -> Result<usize> {
        let mut written = 0;
        for (dr, row) in rows.iter().enumerate() {
            for (dc, value) in row.iter().enumerate() {
                let (r, c) = (start_row + dr as u32, start_column + dc as u32);
                self.check_bounds(r, c)?;
                if let Some(merge) = self.covering_merge(r, c) {
                    if (merge.start_row_index, merge.start_column_index) != (r, c) {
                        return Err(invalid(format!(
                            "cell ({r}, {c}) is inside merge {merge:?} but is not its lead cell"
                        )));
                    }
                }
                if value.is_empty() {
                    self.values.remove(&(r, c));
                } else {
                    self.values.insert((r, c), value.clone());
                }
                written += 1;
            }
        }
        Ok(written)
    }

    fn read(&self, range: &GridRange) -> Vec<Vec<String>> {
        let end_row = range.end_row_index.min(self.row_count);
        let end_column = range.end_column_index.min(self.column_count);

        let mut rows: Vec<Vec<String>> = (range.start_row_index..end_row)
            .map(|row| {
                let mut cells: Vec<String> = (range.start_column_index..end_column)
                    .map(|column| self.values.get(&(row, column)).cloned().unwrap_or_default())
                    .collect();
                while cells.last().is_some_and(String::is_empty) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        rows
    }
}

fn cells_of(range: &GridRange) -> impl Iterator<Item = (u32, u32)> + '_ {
    (range.start_row_index..range.end_row_index).flat_map(move |row| {
        (range.start_column_index..range.end_column_index).map(move |column| (row, column))
    })
}

fn shift_rows<V>(cells: BTreeMap<(u32, u32), V>, start: u32, count: u32) -> BTreeMap<(u32, u32), V> {
    cells
        .into_iter()
        .map(|((row, column), value)| {
            let row = if row >= start { row + count } else { row };
            ((row, column), value)
        })
        .collect()
}

fn invalid(message: String) -> SheetfillError {
    SheetfillError::Store(GridStoreError::InvalidRequest(message))
}

/// Store operation a fault can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    SheetMetadata,
    GetValues,
    BatchUpdateValues,
    BatchUpdate,
}

/// Failure returned by the next matching call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFault {
    /// Rate limited; retryable
    Quota,
    /// 503 from the store; fatal
    Server,
}

impl InjectedFault {
    fn into_error(self, operation: StoreOperation) -> SheetfillError {
        match self {
            InjectedFault::Quota => {
                SheetfillError::QuotaExceeded(format!("injected rate limit on {operation:?}"))
            }
            InjectedFault::Server => SheetfillError::Store(GridStoreError::ServerError {
                status: 503,
                message: format!("injected failure on {operation:?}"),
            }),
        }
    }
}

/// Number of calls made against the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounters {
    pub metadata_reads: usize,
    pub value_reads: usize,
    pub value_writes: usize,
    pub cells_written: usize,
    pub batch_updates: usize,
    pub requests_applied: usize,
}

impl CallCounters {
    /// Every call that reached the store
    pub fn total_calls(&self) -> usize {
        self.metadata_reads + self.value_reads + self.value_writes + self.batch_updates
    }
}

#[derive(Default)]
struct StoreState {
    documents: HashMap<DocumentId, Vec<MemorySheet>>,
    counters: CallCounters,
    faults: VecDeque<(StoreOperation, InjectedFault)>,
}

impl StoreState {
    fn take_fault(&mut self, operation: StoreOperation) -> Result<()> {
        if let Some(pos) = self.faults.iter().position(|(op, _)| *op == operation) {
            if let Some((op, fault)) = self.faults.remove(pos) {
                return Err(fault.into_error(op));
            }
        }
        Ok(())
    }

    fn sheets_mut(&mut self, document: &DocumentId) -> Result<&mut Vec<MemorySheet>> {
        self.documents
            .get_mut(document)
            .ok_or_else(|| SheetfillError::NotFound(format!("document '{document}'")))
    }

    fn sheets(&self, document: &DocumentId) -> Result<&Vec<MemorySheet>> {
        self.documents
            .get(document)
            .ok_or_else(|| SheetfillError::NotFound(format!("document '{document}'")))
    }
}

fn find_sheet_index(sheets: &[MemorySheet], title: Option<&str>) -> Result<usize> {
    match title {
        Some(title) => sheets
            .iter()
            .position(|sheet| sheet.title == title)
            .ok_or_else(|| SheetfillError::NotFound(format!("sheet '{title}'"))),
        None if sheets.is_empty() => {
            Err(SheetfillError::NotFound("document has no sheets".to_string()))
        }
        None => Ok(0),
    }
}

/// Grid store backed by process memory
#[derive(Default)]
pub struct InMemoryGridStore {
    state: Mutex<StoreState>,
}

impl InMemoryGridStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a document made of the given sheets
    pub fn add_document(&self, document: DocumentId, sheets: Vec<MemorySheet>) {
        self.state().documents.insert(document, sheets);
    }

    /// The next call of `operation` fails with `fault`
    pub fn inject_fault(&self, operation: StoreOperation, fault: InjectedFault) {
        self.state().faults.push_back((operation, fault));
    }

    pub fn counters(&self) -> CallCounters {
        self.state().counters
    }

    pub fn reset_counters(&self) {
        self.state().counters = CallCounters::default();
    }

    /// Snapshot of a sheet (first sheet when `title` is `None`)
    pub fn sheet(&self, document: &DocumentId, title: Option<&str>) -> Option<MemorySheet> {
        let state = self.state();
        let sheets = state.documents.get(document)?;
        let index = find_sheet_index(sheets, title).ok()?;
        sheets.get(index).cloned()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl GridStore for InMemoryGridStore {
    async fn sheet_metadata(
        &self,
        document: &DocumentId,
        sheet: Option<&SheetName>,
    ) -> Result<SheetMetadata> {
        let mut state = self.state();
        state.take_fault(StoreOperation::SheetMetadata)?;
        state.counters.metadata_reads += 1;

        let sheets = state.sheets(document)?;
        let index = find_sheet_index(sheets, sheet.map(SheetName::as_str))?;
        sheets[index].metadata()
    }

    async fn get_values(&self, document: &DocumentId, range: &str) -> Result<Vec<Vec<String>>> {
        let mut state = self.state();
        state.take_fault(StoreOperation::GetValues)?;
        state.counters.value_reads += 1;

        let (title, reference) = split_sheet_prefix(range);
        let sheets = state.sheets(document)?;
        let sheet = &sheets[find_sheet_index(sheets, title.as_deref())?];
        let grid = parse_reference(reference)?.to_grid_range(sheet.sheet_id);
        Ok(sheet.read(&grid))
    }

    async fn batch_update_values(
        &self,
        document: &DocumentId,
        updates: &[ValueRange],
        _mode: ValueInputMode,
    ) -> Result<usize> {
        let mut state = self.state();
        state.take_fault(StoreOperation::BatchUpdateValues)?;
        state.counters.value_writes += 1;

        let mut sheets = state.sheets(document)?.clone();
        let mut written = 0;
        for update in updates {
            let (title, reference) = split_sheet_prefix(&update.range);
            let index = find_sheet_index(&sheets, title.as_deref())?;
            let target = parse_reference(reference)?;
            written += sheets[index].write(
                target.start_row() - 1,
                target.start_column_index(),
                &update.values,
            )?;
        }

        *state.sheets_mut(document)? = sheets;
        state.counters.cells_written += written;
        Ok(written)
    }

    async fn batch_update(&self, document: &DocumentId, requests: &[GridRequest]) -> Result<()> {
        let mut state = self.state();
        state.take_fault(StoreOperation::BatchUpdate)?;
        state.counters.batch_updates += 1;

        let mut sheets = state.sheets(document)?.clone();
        for request in requests {
            let sheet_id = match request {
                GridRequest::InsertRows { sheet_id, .. } => *sheet_id,
                GridRequest::CopyFormat { destination, .. } => destination.sheet_id,
                GridRequest::MergeCells { range } => range.sheet_id,
            };
            let sheet = sheets
                .iter_mut()
                .find(|sheet| sheet.sheet_id == sheet_id)
                .ok_or_else(|| invalid(format!("no sheet with id {sheet_id}")))?;

            match request {
                GridRequest::InsertRows {
                    start_index,
                    count,
                    inherit_from_before,
                    ..
                } => sheet.insert_rows(*start_index, *count, *inherit_from_before)?,
                GridRequest::CopyFormat {
                    source,
                    destination,
                } => sheet.copy_format(source, destination)?,
                GridRequest::MergeCells { range } => sheet.merge(*range)?,
            }
        }

        *state.sheets_mut(document)? = sheets;
        state.counters.requests_applied += requests.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentId {
        DocumentId::new("doc-1").unwrap()
    }

    fn store_with(sheet: MemorySheet) -> InMemoryGridStore {
        let store = InMemoryGridStore::new();
        store.add_document(doc(), vec![sheet]);
        store
    }

    fn template_sheet() -> MemorySheet {
        MemorySheet::new(0, "Hoja 1", 60, 30)
            .with_value("E44", "header")
            .unwrap()
            .with_value("E46", "TOTAL")
            .unwrap()
            .with_format("E45:AB45", CellFormat::new("bordered"))
            .unwrap()
            .with_merge("F45:V45")
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_rows_shifts_values_formats_and_merges() {
        let store = store_with(template_sheet());
        store
            .batch_update(
                &doc(),
                &[GridRequest::InsertRows {
                    sheet_id: 0,
                    start_index: 44,
                    count: 3,
                    inherit_from_before: true,
                }],
            )
            .await
            .unwrap();

        let sheet = store.sheet(&doc(), None).unwrap();
        assert_eq!(sheet.row_count(), 63);
        assert_eq!(sheet.value_at("E44"), Some("header"));
        assert_eq!(sheet.value_at("E49"), Some("TOTAL"));
        assert_eq!(sheet.format_at("E48"), Some(&CellFormat::new("bordered")));
        assert_eq!(sheet.merges()[0].start_row_index, 47);
        // Row 44 had no format, so the inserted rows inherit nothing
        assert_eq!(sheet.format_at("E45"), None);
    }

    #[tokio::test]
    async fn test_insert_rows_inherits_from_row_above() {
        let sheet = MemorySheet::new(0, "Hoja 1", 10, 5)
            .with_format("A2:E2", CellFormat::new("zebra"))
            .unwrap();
        let store = store_with(sheet);
        store
            .batch_update(
                &doc(),
                &[GridRequest::InsertRows {
                    sheet_id: 0,
                    start_index: 2,
                    count: 2,
                    inherit_from_before: true,
                }],
            )
            .await
            .unwrap();

        let sheet = store.sheet(&doc(), None).unwrap();
        assert_eq!(sheet.format_at("C3"), Some(&CellFormat::new("zebra")));
        assert_eq!(sheet.format_at("C4"), Some(&CellFormat::new("zebra")));
        assert_eq!(sheet.format_at("C5"), None);
    }

    #[tokio::test]
    async fn test_merge_overlap_is_rejected_atomically() {
        let store = store_with(template_sheet());
        let sheet_before = store.sheet(&doc(), None).unwrap();
        let result = store
            .batch_update(
                &doc(),
                &[
                    GridRequest::MergeCells {
                        range: GridRange {
                            sheet_id: 0,
                            start_row_index: 50,
                            end_row_index: 51,
                            start_column_index: 0,
                            end_column_index: 2,
                        },
                    },
                    GridRequest::MergeCells {
                        range: GridRange {
                            sheet_id: 0,
                            start_row_index: 44,
                            end_row_index: 45,
                            start_column_index: 6,
                            end_column_index: 8,
                        },
                    },
                ],
            )
            .await;

        assert!(matches!(
            result,
            Err(SheetfillError::Store(GridStoreError::InvalidRequest(_)))
        ));
        assert_eq!(store.sheet(&doc(), None).unwrap(), sheet_before);
    }

    #[tokio::test]
    async fn test_writes_only_accepted_at_lead_cell() {
        let store = store_with(template_sheet());
        let ok = store
            .batch_update_values(&doc(), &[ValueRange::cell("F45", "Hotel")], ValueInputMode::Raw)
            .await
            .unwrap();
        assert_eq!(ok, 1);

        let err = store
            .batch_update_values(&doc(), &[ValueRange::cell("G45", "x")], ValueInputMode::Raw)
            .await
            .unwrap_err();
        assert!(matches!(err, SheetfillError::Store(GridStoreError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_copy_format_tiles_source() {
        let store = store_with(template_sheet());
        let source = GridRange {
            sheet_id: 0,
            start_row_index: 44,
            end_row_index: 45,
            start_column_index: 4,
            end_column_index: 28,
        };
        store
            .batch_update(
                &doc(),
                &[GridRequest::CopyFormat {
                    source,
                    destination: source.on_row(50),
                }],
            )
            .await
            .unwrap();
        let sheet = store.sheet(&doc(), None).unwrap();
        assert_eq!(sheet.format_at("AB51"), Some(&CellFormat::new("bordered")));
        assert_eq!(sheet.format_at("AC51"), None);
    }

    #[tokio::test]
    async fn test_get_values_trims_trailing_empties() {
        let store = store_with(template_sheet());
        let values = store.get_values(&doc(), "'Hoja 1'!A1:AD60").await.unwrap();
        assert_eq!(values.len(), 46);
        assert_eq!(values[43], vec!["", "", "", "", "header"]);
        assert!(values[44].is_empty());
    }

    #[tokio::test]
    async fn test_unknown_document_and_sheet() {
        let store = store_with(template_sheet());
        let missing = DocumentId::new("other").unwrap();
        assert!(matches!(
            store.sheet_metadata(&missing, None).await,
            Err(SheetfillError::NotFound(_))
        ));
        let sheet = SheetName::new("Resumen").unwrap();
        assert!(matches!(
            store.sheet_metadata(&doc(), Some(&sheet)).await,
            Err(SheetfillError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_fault_is_one_shot() {
        let store = store_with(template_sheet());
        store.inject_fault(StoreOperation::SheetMetadata, InjectedFault::Quota);

        let first = store.sheet_metadata(&doc(), None).await;
        assert!(matches!(first, Err(SheetfillError::QuotaExceeded(_))));
        assert!(store.sheet_metadata(&doc(), None).await.is_ok());
        assert_eq!(store.counters().metadata_reads, 1);
    }
}
