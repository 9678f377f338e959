//! Record to row mapping
//!
//! Turns one [`Record`] into the cell values of one template-shaped row.

use crate::core::template::TemplateConfig;
use crate::domain::Record;
use std::collections::BTreeMap;

/// Maps records onto the column layout of a template row
#[derive(Debug, Clone, Copy)]
pub struct RecordMapper<'a> {
    config: &'a TemplateConfig,
}

impl<'a> RecordMapper<'a> {
    pub fn new(config: &'a TemplateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a TemplateConfig {
        self.config
    }

    /// Display value of one logical field
    ///
    /// Uses the upstream pre-formatted text when supplied, else the raw
    /// value. A field with no resolvable attribute yields the configured
    /// default (empty string unless overridden).
    pub fn field_value(&self, field: &str, record: &Record) -> String {
        match self.config.resolve_attribute(field, record) {
            Some(attribute) => record
                .formatted(attribute.name)
                .map(str::to_string)
                .unwrap_or_else(|| attribute.value.render()),
            None => self.config.default_value.clone(),
        }
    }

    /// All declared fields of a record, keyed by field
    pub fn format_data(&self, record: &Record) -> BTreeMap<String, String> {
        self.config
            .columns
            .keys()
            .map(|field| (field.clone(), self.field_value(field, record)))
            .collect()
    }

    /// Cell values spanning the full template row width
    ///
    /// Each field lands at its lead column's offset from the template row's
    /// leftmost column; every other slot is an empty string.
    pub fn create_row(&self, record: &Record) -> Vec<String> {
        let origin = self.config.template_row_range.start_column_index();
        let mut row = vec![String::new(); self.config.template_row_range.width()];

        for (field, value) in self.format_data(record) {
            let Some(spec) = self.config.columns.get(&field) else {
                continue;
            };
            let offset = spec.start_column_index.saturating_sub(origin) as usize;
            if let Some(slot) = row.get_mut(offset) {
                *slot = value;
            }
        }

        row
    }

    pub fn create_rows(&self, records: &[Record]) -> Vec<Vec<String>> {
        records.iter().map(|record| self.create_row(record)).collect()
    }
}
