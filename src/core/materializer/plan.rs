//! Insertion planning

use crate::core::coordinates::CellRange;
use crate::core::template::TemplateConfig;
use crate::domain::Record;
use serde::Serialize;
use std::ops::Range;

/// Where new rows go and how many
///
/// The anchor is the configured constant for the document type; it is never
/// located by scanning the live document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsertionPlan {
    /// 1-based row that becomes the first inserted row
    pub anchor_row: u32,
    pub row_count: u32,
}

impl InsertionPlan {
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// 0-based index of the first inserted row
    pub fn anchor_index(&self) -> u32 {
        self.anchor_row.saturating_sub(1)
    }

    /// 1-based row numbers of the inserted rows
    pub fn row_numbers(&self) -> Range<u32> {
        self.anchor_row..self.anchor_row + self.row_count
    }

    /// 0-based indices of the inserted rows
    pub fn row_indices(&self) -> Range<u32> {
        self.anchor_index()..self.anchor_index() + self.row_count
    }

    /// 1-based row of the template row once the insert has landed
    ///
    /// A template row at or below the anchor is pushed down by the inserted
    /// block; one above it stays put.
    pub fn live_template_row(&self, template_row: &CellRange) -> u32 {
        if template_row.start_row() >= self.anchor_row {
            template_row.start_row() + self.row_count
        } else {
            template_row.start_row()
        }
    }
}

/// One row per record, inserted at the configured anchor
pub fn plan(records: &[Record], config: &TemplateConfig) -> InsertionPlan {
    InsertionPlan {
        anchor_row: config.insert_anchor_row,
        row_count: records.len() as u32,
    }
}
