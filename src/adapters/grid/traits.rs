//! Grid document store abstraction
//!
//! This module defines the [`GridStore`] trait that every spreadsheet backend
//! implements. Value reads and writes are addressed in A1 notation;
//! structural requests (row insertion, format copy, merges) use 0-based
//! [`GridRange`]s.

use crate::core::coordinates::GridRange;
use crate::domain::{DocumentId, Result, SheetName, SheetfillError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// How the store interprets written values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputMode {
    /// Stored verbatim as text
    Raw,
    /// Parsed as if typed by a user (numbers, dates, currency)
    #[default]
    UserEntered,
}

impl ValueInputMode {
    pub fn as_api_str(self) -> &'static str {
        match self {
            ValueInputMode::Raw => "RAW",
            ValueInputMode::UserEntered => "USER_ENTERED",
        }
    }
}

impl fmt::Display for ValueInputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

impl FromStr for ValueInputMode {
    type Err = SheetfillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "raw" => Ok(ValueInputMode::Raw),
            "user_entered" | "user-entered" => Ok(ValueInputMode::UserEntered),
            other => Err(SheetfillError::Configuration(format!(
                "Invalid value input mode '{other}'. Must be one of: raw, user_entered"
            ))),
        }
    }
}

/// Structure of one sheet as seen right now in the live document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetMetadata {
    pub sheet_id: i64,
    pub title: SheetName,
    pub row_count: u32,
    pub column_count: u32,
    /// Every merge region currently defined on the sheet
    pub merges: Vec<GridRange>,
}

impl SheetMetadata {
    /// Merges covering a given 0-based row
    pub fn merges_on_row(&self, row_index: u32) -> impl Iterator<Item = &GridRange> {
        self.merges
            .iter()
            .filter(move |merge| merge.contains_row(row_index))
    }
}

/// Values destined for one A1 range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    /// A single-cell write
    pub fn cell(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            values: vec![vec![value.into()]],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.values.iter().map(Vec::len).sum()
    }
}

/// Structural change applied through a batch update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridRequest {
    /// Insert `count` empty rows before 0-based `start_index`
    InsertRows {
        sheet_id: i64,
        start_index: u32,
        count: u32,
        /// Take formatting from the row above instead of the row below
        inherit_from_before: bool,
    },
    /// Copy formatting only (no values) from `source` onto `destination`
    CopyFormat {
        source: GridRange,
        destination: GridRange,
    },
    /// Merge all cells of `range` into one
    MergeCells { range: GridRange },
}

impl GridRequest {
    /// Wire form used by the REST batch update endpoint
    pub fn to_api_json(&self) -> Value {
        match self {
            GridRequest::InsertRows {
                sheet_id,
                start_index,
                count,
                inherit_from_before,
            } => json!({
                "insertDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": start_index,
                        "endIndex": start_index + count,
                    },
                    "inheritFromBefore": inherit_from_before,
                }
            }),
            GridRequest::CopyFormat {
                source,
                destination,
            } => json!({
                "copyPaste": {
                    "source": source,
                    "destination": destination,
                    "pasteType": "PASTE_FORMAT",
                    "pasteOrientation": "NORMAL",
                }
            }),
            GridRequest::MergeCells { range } => json!({
                "mergeCells": {
                    "range": range,
                    "mergeType": "MERGE_ALL",
                }
            }),
        }
    }
}

/// Grid document store operations
///
/// Implementations must map rate limiting to
/// [`SheetfillError::QuotaExceeded`] and unknown documents or sheets to
/// [`SheetfillError::NotFound`].
#[async_trait]
pub trait GridStore: Send + Sync {
    /// Reads dimensions, id and merge list of a sheet (first sheet when `None`)
    async fn sheet_metadata(
        &self,
        document: &DocumentId,
        sheet: Option<&SheetName>,
    ) -> Result<SheetMetadata>;

    /// Reads formatted values of an A1 range
    ///
    /// Trailing empty rows and cells may be omitted by the store.
    async fn get_values(&self, document: &DocumentId, range: &str) -> Result<Vec<Vec<String>>>;

    /// Writes several value ranges in one call, returning the number of cells updated
    async fn batch_update_values(
        &self,
        document: &DocumentId,
        updates: &[ValueRange],
        mode: ValueInputMode,
    ) -> Result<usize>;

    /// Applies structural requests in order, atomically
    async fn batch_update(&self, document: &DocumentId, requests: &[GridRequest]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_input_mode_parsing() {
        assert_eq!(ValueInputMode::from_str("raw").unwrap(), ValueInputMode::Raw);
        assert_eq!(
            ValueInputMode::from_str("USER_ENTERED").unwrap(),
            ValueInputMode::UserEntered
        );
        assert!(ValueInputMode::from_str("formula").is_err());
    }

    #[test]
    fn test_insert_rows_wire_form() {
        let request = GridRequest::InsertRows {
            sheet_id: 3,
            start_index: 44,
            count: 3,
            inherit_from_before: true,
        };
        let body = request.to_api_json();
        assert_eq!(body["insertDimension"]["range"]["startIndex"], 44);
        assert_eq!(body["insertDimension"]["range"]["endIndex"], 47);
        assert_eq!(body["insertDimension"]["range"]["dimension"], "ROWS");
        assert_eq!(body["insertDimension"]["inheritFromBefore"], true);
    }

    #[test]
    fn test_merge_wire_form_uses_camel_case_ranges() {
        let range = GridRange {
            sheet_id: 0,
            start_row_index: 44,
            end_row_index: 45,
            start_column_index: 5,
            end_column_index: 22,
        };
        let body = GridRequest::MergeCells { range }.to_api_json();
        assert_eq!(body["mergeCells"]["range"]["startColumnIndex"], 5);
        assert_eq!(body["mergeCells"]["mergeType"], "MERGE_ALL");
    }

    #[test]
    fn test_value_range_cell_count() {
        let update = ValueRange::cell("E45", "8.1");
        assert_eq!(update.cell_count(), 1);
    }
}
