//! Spreadsheet coordinate conversions
//!
//! The grid store speaks two dialects: A1 notation (column letters plus a
//! 1-based row) for value reads and writes, and 0-based, end-exclusive
//! indices for structural requests such as row insertion and merges. This
//! module is the only place that translates between them.
//!
//! Column letters form a bijective base-26 numeral system: `A`..`Z` are the
//! digits 1..26 and there is no zero digit, so `Z` is followed by `AA`.

use crate::domain::{Result, SheetName, SheetfillError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Largest column index accepted (`XFD`, the common spreadsheet limit, is 16383)
pub const MAX_COLUMN_INDEX: u32 = 18_277; // ZZZ

/// Converts column letters to a 0-based column index (`A` -> 0, `AA` -> 26)
///
/// Letters are case-insensitive.
///
/// # Errors
///
/// Returns [`SheetfillError::Format`] for empty input, non-letters, or columns
/// beyond `ZZZ`.
pub fn column_to_index(letters: &str) -> Result<u32> {
    let letters = letters.trim();
    if letters.is_empty() {
        return Err(SheetfillError::Format("empty column reference".to_string()));
    }

    let mut value: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(SheetfillError::Format(format!(
                "invalid column reference '{letters}'"
            )));
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        value = value
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .filter(|v| *v - 1 <= MAX_COLUMN_INDEX)
            .ok_or_else(|| {
                SheetfillError::Format(format!("column reference out of range '{letters}'"))
            })?;
    }

    Ok(value - 1)
}

/// Converts a 0-based column index to letters (`0` -> `A`, `701` -> `ZZ`)
pub fn index_to_column(index: u32) -> String {
    let mut out = Vec::new();
    let mut n = index as u64 + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    out.iter().rev().collect()
}

/// A rectangular range in A1 terms: columns and 1-based inclusive rows
///
/// Only constructed through [`CellRange::new`], [`CellRange::row_span`] or
/// [`parse_range`], so the stored column indices are always valid. Serializes
/// as its A1 text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRange {
    start_column_index: u32,
    end_column_index: u32,
    start_row: u32,
    end_row: u32,
}

impl CellRange {
    /// Builds a range, normalizing letter case and validating bounds
    pub fn new(
        start_column: &str,
        start_row: u32,
        end_column: &str,
        end_row: u32,
    ) -> Result<Self> {
        let start_index = column_to_index(start_column)?;
        let end_index = column_to_index(end_column)?;
        if start_row == 0 || end_row == 0 {
            return Err(SheetfillError::Format("rows are 1-based".to_string()));
        }
        if start_index > end_index || start_row > end_row {
            return Err(SheetfillError::Format(format!(
                "range start {start_column}{start_row} is after end {end_column}{end_row}"
            )));
        }
        Ok(Self {
            start_column_index: start_index,
            end_column_index: end_index,
            start_row,
            end_row,
        })
    }

    /// A single-row range spanning the given 0-based column indices (inclusive)
    pub fn row_span(start_col_index: u32, end_col_index: u32, row: u32) -> Self {
        Self {
            start_column_index: start_col_index.min(end_col_index),
            end_column_index: start_col_index.max(end_col_index),
            start_row: row.max(1),
            end_row: row.max(1),
        }
    }

    /// The same columns over a different row block
    ///
    /// # Errors
    ///
    /// Returns [`SheetfillError::Format`] for row 0 or an inverted row block.
    pub fn with_rows(&self, start_row: u32, end_row: u32) -> Result<Self> {
        if start_row == 0 || start_row > end_row {
            return Err(SheetfillError::Format(format!(
                "invalid row block {start_row}..{end_row}"
            )));
        }
        Ok(Self {
            start_row,
            end_row,
            ..self.clone()
        })
    }

    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    pub fn end_row(&self) -> u32 {
        self.end_row
    }

    /// Lead column letters
    pub fn start_column(&self) -> String {
        index_to_column(self.start_column_index)
    }

    pub fn end_column(&self) -> String {
        index_to_column(self.end_column_index)
    }

    pub fn is_single_row(&self) -> bool {
        self.start_row == self.end_row
    }

    pub fn start_column_index(&self) -> u32 {
        self.start_column_index
    }

    pub fn end_column_index(&self) -> u32 {
        self.end_column_index
    }

    /// Number of columns covered
    pub fn width(&self) -> usize {
        (self.end_column_index - self.start_column_index) as usize + 1
    }

    /// Whether a 0-based column index lies inside the range
    pub fn contains_column(&self, column_index: u32) -> bool {
        (self.start_column_index..=self.end_column_index).contains(&column_index)
    }

    /// 0-based, end-exclusive form used by structural requests
    pub fn to_grid_range(&self, sheet_id: i64) -> GridRange {
        GridRange {
            sheet_id,
            start_row_index: self.start_row - 1,
            end_row_index: self.end_row,
            start_column_index: self.start_column_index,
            end_column_index: self.end_column_index + 1,
        }
    }

    /// A1 text, optionally qualified with a sheet name
    pub fn to_a1(&self, sheet: Option<&SheetName>) -> String {
        match sheet {
            Some(sheet) => format!("{}{}", sheet.a1_prefix(), self),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            self.start_column(),
            self.start_row,
            self.end_column(),
            self.end_row
        )
    }
}

impl TryFrom<String> for CellRange {
    type Error = SheetfillError;

    fn try_from(text: String) -> Result<Self> {
        parse_range(&text)
    }
}

impl From<CellRange> for String {
    fn from(range: CellRange) -> Self {
        range.to_string()
    }
}

impl FromStr for CellRange {
    type Err = SheetfillError;

    fn from_str(s: &str) -> Result<Self> {
        parse_range(s)
    }
}

fn range_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^\$?([A-Za-z]{1,3})\$?([1-9][0-9]*):\$?([A-Za-z]{1,3})\$?([1-9][0-9]*)$")
            .expect("range pattern is valid")
    })
}

fn cell_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^\$?([A-Za-z]{1,3})\$?([1-9][0-9]*)$").expect("cell pattern is valid")
    })
}

/// Parses `"<col><row>:<col><row>"`, e.g. `"E45:AB45"`
///
/// `$` absolute markers are tolerated and ignored.
///
/// # Errors
///
/// Returns [`SheetfillError::Format`] when the text does not match the pattern
/// or the start lies after the end.
pub fn parse_range(text: &str) -> Result<CellRange> {
    let text = text.trim();
    let caps = range_pattern()
        .captures(text)
        .ok_or_else(|| SheetfillError::Format(format!("invalid range '{text}'")))?;

    let start_row = parse_row(&caps[2], text)?;
    let end_row = parse_row(&caps[4], text)?;
    CellRange::new(&caps[1], start_row, &caps[3], end_row)
}

/// Parses a single cell reference such as `"X45"` into (0-based column, 1-based row)
pub fn parse_cell(text: &str) -> Result<(u32, u32)> {
    let text = text.trim();
    let caps = cell_pattern()
        .captures(text)
        .ok_or_else(|| SheetfillError::Format(format!("invalid cell reference '{text}'")))?;
    Ok((column_to_index(&caps[1])?, parse_row(&caps[2], text)?))
}

/// Parses either a range or a single cell (as a one-cell range)
pub fn parse_reference(text: &str) -> Result<CellRange> {
    if text.contains(':') {
        return parse_range(text);
    }
    let (column, row) = parse_cell(text)?;
    Ok(CellRange::row_span(column, column, row))
}

/// Splits `'Hoja 1'!E45:F45` into the unquoted sheet name and the reference
pub fn split_sheet_prefix(text: &str) -> (Option<String>, &str) {
    match text.rfind('!') {
        Some(pos) => {
            let raw = text[..pos].trim();
            let name = raw
                .strip_prefix('\'')
                .and_then(|inner| inner.strip_suffix('\''))
                .map(|inner| inner.replace("''", "'"))
                .unwrap_or_else(|| raw.to_string());
            (Some(name), &text[pos + 1..])
        }
        None => (None, text),
    }
}

fn parse_row(digits: &str, context: &str) -> Result<u32> {
    digits
        .parse()
        .map_err(|_| SheetfillError::Format(format!("row out of range in '{context}'")))
}

/// A1 address of a single cell from a 0-based column and 1-based row
pub fn cell_a1(column_index: u32, row: u32) -> String {
    format!("{}{}", index_to_column(column_index), row)
}

/// A range in the store's structural form: 0-based indices, end-exclusive
///
/// Zero-valued fields may be omitted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: u32,
    pub end_row_index: u32,
    pub start_column_index: u32,
    pub end_column_index: u32,
}

impl GridRange {
    /// Whether the range covers the given 0-based row
    pub fn contains_row(&self, row_index: u32) -> bool {
        self.start_row_index <= row_index && row_index < self.end_row_index
    }

    /// Whether the range shares at least one column with `[start, end)`
    pub fn intersects_columns(&self, start: u32, end: u32) -> bool {
        self.start_column_index < end && start < self.end_column_index
    }

    pub fn overlaps(&self, other: &GridRange) -> bool {
        self.sheet_id == other.sheet_id
            && self.start_row_index < other.end_row_index
            && other.start_row_index < self.end_row_index
            && self.intersects_columns(other.start_column_index, other.end_column_index)
    }

    /// The same columns placed on a single 0-based row
    pub fn on_row(&self, row_index: u32) -> GridRange {
        GridRange {
            start_row_index: row_index,
            end_row_index: row_index + 1,
            ..*self
        }
    }

    pub fn row_count(&self) -> u32 {
        self.end_row_index.saturating_sub(self.start_row_index)
    }

    pub fn column_count(&self) -> u32 {
        self.end_column_index.saturating_sub(self.start_column_index)
    }

    /// Back to A1 terms; `None` for an empty range
    pub fn to_cell_range(&self) -> Option<CellRange> {
        if self.row_count() == 0 || self.column_count() == 0 {
            return None;
        }
        Some(CellRange {
            start_column_index: self.start_column_index,
            end_column_index: self.end_column_index - 1,
            start_row: self.start_row_index + 1,
            end_row: self.end_row_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A" => 0)]
    #[test_case("Z" => 25)]
    #[test_case("AA" => 26)]
    #[test_case("AB" => 27)]
    #[test_case("ZZ" => 701)]
    #[test_case("AAA" => 702)]
    #[test_case("x" => 23)]
    fn test_column_to_index(letters: &str) -> u32 {
        column_to_index(letters).unwrap()
    }

    #[test_case(0 => "A")]
    #[test_case(25 => "Z")]
    #[test_case(26 => "AA")]
    #[test_case(51 => "AZ")]
    #[test_case(52 => "BA")]
    #[test_case(701 => "ZZ")]
    #[test_case(702 => "AAA")]
    fn test_index_to_column(index: u32) -> String {
        index_to_column(index)
    }

    #[test]
    fn test_round_trip_over_three_letter_columns() {
        for i in 0..=MAX_COLUMN_INDEX {
            assert_eq!(column_to_index(&index_to_column(i)).unwrap(), i);
        }
    }

    #[test_case("" ; "empty")]
    #[test_case("A1" ; "digits")]
    #[test_case("ÄB" ; "non ascii")]
    #[test_case("AAAA" ; "beyond ZZZ")]
    fn test_column_to_index_rejects(letters: &str) {
        assert!(matches!(column_to_index(letters), Err(SheetfillError::Format(_))));
    }

    #[test]
    fn test_parse_range() {
        let range = parse_range("E45:AB45").unwrap();
        assert_eq!(range.start_column(), "E");
        assert_eq!(range.end_column(), "AB");
        assert_eq!(range.start_row(), 45);
        assert_eq!(range.end_row(), 45);
        assert!(range.is_single_row());
        assert_eq!(range.width(), 24);
        assert_eq!(range.to_string(), "E45:AB45");
    }

    #[test]
    fn test_parse_range_normalizes_case_and_markers() {
        let range = parse_range(" $f$10:h12 ").unwrap();
        assert_eq!(range.to_string(), "F10:H12");
    }

    #[test_case("E45" ; "single cell")]
    #[test_case("E45:" ; "missing end")]
    #[test_case("45:AB45" ; "missing column")]
    #[test_case("E0:F1" ; "zero row")]
    #[test_case("F45:E45" ; "reversed columns")]
    #[test_case("E46:E45" ; "reversed rows")]
    #[test_case("Hoja!E45:F45" ; "sheet prefix")]
    fn test_parse_range_rejects(text: &str) {
        assert!(matches!(parse_range(text), Err(SheetfillError::Format(_))));
    }

    #[test]
    fn test_to_grid_range() {
        let grid = parse_range("E45:AB45").unwrap().to_grid_range(7);
        assert_eq!(
            grid,
            GridRange {
                sheet_id: 7,
                start_row_index: 44,
                end_row_index: 45,
                start_column_index: 4,
                end_column_index: 28,
            }
        );
        assert_eq!(grid.to_cell_range().unwrap().to_string(), "E45:AB45");
    }

    #[test]
    fn test_to_a1_with_sheet() {
        let range = parse_range("E45:F45").unwrap();
        let sheet = SheetName::new("Legalización").unwrap();
        assert_eq!(range.to_a1(Some(&sheet)), "'Legalización'!E45:F45");
        assert_eq!(range.to_a1(None), "E45:F45");
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("X45").unwrap(), (23, 45));
        assert!(parse_cell("X").is_err());
        assert_eq!(cell_a1(23, 45), "X45");
    }

    #[test]
    fn test_split_sheet_prefix() {
        assert_eq!(
            split_sheet_prefix("'Hoja ''1'''!E45:F45"),
            (Some("Hoja '1'".to_string()), "E45:F45")
        );
        assert_eq!(split_sheet_prefix("Datos!A1"), (Some("Datos".to_string()), "A1"));
        assert_eq!(split_sheet_prefix("A1:B2"), (None, "A1:B2"));
    }

    #[test]
    fn test_parse_reference_accepts_single_cell() {
        assert_eq!(parse_reference("X45").unwrap().to_string(), "X45:X45");
        assert_eq!(parse_reference("A1:C3").unwrap().width(), 3);
    }

    #[test]
    fn test_grid_range_tolerates_omitted_zero_fields() {
        let grid: GridRange = serde_json::from_str(
            r#"{"endRowIndex": 1, "startColumnIndex": 2, "endColumnIndex": 4}"#,
        )
        .unwrap();
        assert_eq!(grid.sheet_id, 0);
        assert_eq!(grid.start_row_index, 0);
        assert_eq!(grid.column_count(), 2);
    }

    #[test]
    fn test_grid_range_row_and_column_checks() {
        let merge = GridRange {
            sheet_id: 0,
            start_row_index: 44,
            end_row_index: 45,
            start_column_index: 5,
            end_column_index: 22,
        };
        assert!(merge.contains_row(44));
        assert!(!merge.contains_row(45));
        assert!(merge.intersects_columns(4, 28));
        assert!(!merge.intersects_columns(22, 28));

        let moved = merge.on_row(47);
        assert_eq!(moved.start_row_index, 47);
        assert_eq!(moved.end_row_index, 48);
        assert!(!moved.overlaps(&merge));
        assert!(merge.overlaps(&merge.on_row(44)));
    }
}
