//! Template configuration types
//!
//! A [`TemplateConfig`] describes, for one document type, where the template
//! row sits, where new rows are inserted and which column each logical field
//! is written to. It is parsed from a structured resource (JSON or TOML) and
//! is immutable once loaded.

use crate::core::coordinates::{
    column_to_index, index_to_column, parse_range, CellRange, MAX_COLUMN_INDEX,
};
use crate::domain::{normalize_key, DocumentType, Record, RecordValue, Result, SheetfillError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placement of one logical field inside the template row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    /// Lead column letters; the only cell written for this field
    pub column: String,
    /// 0-based index of the lead column
    pub start_column_index: u32,
    /// Number of columns covered (merged) by the field, at least 1
    pub span: u32,
}

impl ColumnSpec {
    pub fn new(column: &str, span: u32) -> Result<Self> {
        let start_column_index = column_to_index(column)?;
        if span == 0 {
            return Err(SheetfillError::Format(format!(
                "column {column} has span 0, expected at least 1"
            )));
        }
        start_column_index
            .checked_add(span - 1)
            .filter(|last| *last <= MAX_COLUMN_INDEX)
            .ok_or_else(|| {
                SheetfillError::Format(format!(
                    "column {column} with span {span} extends past the last column"
                ))
            })?;
        Ok(Self {
            column: index_to_column(start_column_index),
            start_column_index,
            span,
        })
    }

    /// 0-based index of the last covered column
    pub fn end_column_index(&self) -> u32 {
        self.start_column_index
            .saturating_add(self.span.saturating_sub(1))
    }
}

/// An attribute found on a record for a logical field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedAttribute<'a> {
    pub name: &'a str,
    pub value: &'a RecordValue,
}

/// Declarative layout of a document type's template row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateConfig {
    pub document_type: DocumentType,
    /// The single row whose formatting and merges are replicated
    pub template_row_range: CellRange,
    pub copy_style: bool,
    /// Fixed 1-based row where new rows are inserted
    pub insert_anchor_row: u32,
    /// Normalized field key -> column placement
    pub columns: BTreeMap<String, ColumnSpec>,
    /// Normalized field key -> preferred record attribute
    pub data_mapping: BTreeMap<String, String>,
    /// Normalized field key -> legacy attribute names, in lookup order
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Value used when no attribute resolves
    pub default_value: String,
}

impl TemplateConfig {
    /// Parses a resource in the given format and validates it
    pub fn from_resource(
        document_type: DocumentType,
        text: &str,
        format: ResourceFormat,
    ) -> Result<Self> {
        let resource: TemplateResource = match format {
            ResourceFormat::Json => serde_json::from_str(text)?,
            ResourceFormat::Toml => toml::from_str(text)?,
        };
        Self::from_parsed(document_type, resource)
    }

    fn from_parsed(document_type: DocumentType, resource: TemplateResource) -> Result<Self> {
        let template_row_range = parse_range(&resource.template_row.range)?;

        let mut columns = BTreeMap::new();
        for (field, column) in resource.columns {
            columns.insert(normalize_key(&field), ColumnSpec::new(&column.column, column.span)?);
        }

        let data_mapping = resource
            .data_mapping
            .into_iter()
            .map(|(field, attribute)| (normalize_key(&field), attribute))
            .collect();

        let mut aliases = super::defaults::legacy_aliases(document_type);
        for (field, names) in resource.aliases {
            aliases.insert(normalize_key(&field), names);
        }

        let config = Self {
            document_type,
            template_row_range,
            copy_style: resource.template_row.copy_style,
            insert_anchor_row: resource.template_row.insert_start_row,
            columns,
            data_mapping,
            aliases,
            default_value: resource.default_value.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the structural invariants of the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.template_row_range.is_single_row() {
            return Err(SheetfillError::Validation(format!(
                "template row range {} must cover exactly one row",
                self.template_row_range
            )));
        }
        if self.insert_anchor_row == 0 {
            return Err(SheetfillError::Validation(
                "insert anchor row is 1-based and must be >= 1".to_string(),
            ));
        }
        if self.columns.is_empty() {
            return Err(SheetfillError::Validation(
                "template declares no columns".to_string(),
            ));
        }
        for (field, spec) in &self.columns {
            if spec.span == 0 {
                return Err(SheetfillError::Validation(format!(
                    "column '{field}' has span 0"
                )));
            }
            if !self.template_row_range.contains_column(spec.start_column_index)
                || !self.template_row_range.contains_column(spec.end_column_index())
            {
                return Err(SheetfillError::Validation(format!(
                    "column '{field}' ({}, span {}) lies outside template row {}",
                    spec.column, spec.span, self.template_row_range
                )));
            }
        }
        Ok(())
    }

    /// Looks up the placement of a field key (`"1,1"` and `"1.1"` are equal)
    ///
    /// # Errors
    ///
    /// Returns [`SheetfillError::NotFound`] for an undeclared key.
    pub fn resolve_column(&self, key: &str) -> Result<&ColumnSpec> {
        let key = normalize_key(key);
        self.columns.get(&key).ok_or_else(|| {
            SheetfillError::NotFound(format!(
                "field '{key}' is not declared for {}",
                self.document_type
            ))
        })
    }

    /// Columns ordered left to right
    pub fn columns_in_order(&self) -> Vec<(&str, &ColumnSpec)> {
        let mut ordered: Vec<_> = self
            .columns
            .iter()
            .map(|(field, spec)| (field.as_str(), spec))
            .collect();
        ordered.sort_by_key(|(_, spec)| spec.start_column_index);
        ordered
    }

    /// Finds the record attribute backing a logical field
    ///
    /// Precedence: the `data_mapping` attribute when present and non-empty,
    /// then an attribute named like the field, then the legacy aliases in
    /// order. `None` means the caller should use [`Self::default_value`].
    pub fn resolve_attribute<'a>(
        &'a self,
        field: &str,
        record: &'a Record,
    ) -> Option<ResolvedAttribute<'a>> {
        let field = normalize_key(field);

        let mut candidates: Vec<&str> = Vec::new();
        if let Some(mapped) = self.data_mapping.get(&field) {
            candidates.push(mapped);
        }
        candidates.push(&field);
        if let Some(aliases) = self.aliases.get(&field) {
            candidates.extend(aliases.iter().map(String::as_str));
        }

        candidates.into_iter().find_map(|name| {
            record
                .entry_non_empty(name)
                .map(|(name, value)| ResolvedAttribute { name, value })
        })
    }
}

/// On-disk formats accepted for template resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFormat {
    Json,
    Toml,
}

impl ResourceFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ResourceFormat::Json => "json",
            ResourceFormat::Toml => "toml",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateResource {
    template_row: TemplateRowResource,
    #[serde(default)]
    columns: BTreeMap<String, ColumnResource>,
    #[serde(default)]
    data_mapping: BTreeMap<String, String>,
    #[serde(default)]
    aliases: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateRowResource {
    range: String,
    #[serde(default = "default_true")]
    copy_style: bool,
    insert_start_row: u32,
}

#[derive(Debug, Deserialize)]
struct ColumnResource {
    column: String,
    #[serde(default = "default_span")]
    span: u32,
}

fn default_true() -> bool {
    true
}

fn default_span() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCE: &str = r#"{
        "templateRow": { "range": "E45:AB45", "copyStyle": true, "insertStartRow": 45 },
        "columns": {
            "id": { "column": "E" },
            "descripcion": { "column": "F", "span": 17 },
            "cantidad": { "column": "X" }
        },
        "dataMapping": { "descripcion": "concepto" }
    }"#;

    fn config() -> TemplateConfig {
        TemplateConfig::from_resource(DocumentType::TravelExpenses, RESOURCE, ResourceFormat::Json)
            .unwrap()
    }

    #[test]
    fn test_parse_json_resource() {
        let config = config();
        assert_eq!(config.insert_anchor_row, 45);
        assert!(config.copy_style);
        assert_eq!(config.template_row_range.to_string(), "E45:AB45");
        assert_eq!(config.resolve_column("descripcion").unwrap().span, 17);
        assert_eq!(config.resolve_column("cantidad").unwrap().start_column_index, 23);
    }

    #[test]
    fn test_parse_toml_resource() {
        let text = r#"
defaultValue = "-"

[templateRow]
range = "B22:M22"
insertStartRow = 22
copyStyle = false

[columns.item]
column = "B"

[columns.descripcion]
column = "C"
span = 6
"#;
        let config =
            TemplateConfig::from_resource(DocumentType::PurchaseOrder, text, ResourceFormat::Toml)
                .unwrap();
        assert!(!config.copy_style);
        assert_eq!(config.default_value, "-");
        assert_eq!(config.columns_in_order()[0].0, "item");
    }

    #[test]
    fn test_unknown_column_is_not_found() {
        let err = config().resolve_column("observaciones").unwrap_err();
        assert!(matches!(err, SheetfillError::NotFound(_)));
    }

    #[test]
    fn test_column_keys_are_normalized() {
        let text = r#"{
            "templateRow": { "range": "A5:C5", "insertStartRow": 5 },
            "columns": { "1,1": { "column": "A" }, "2.1": { "column": "B" } }
        }"#;
        let config =
            TemplateConfig::from_resource(DocumentType::PurchaseOrder, text, ResourceFormat::Json)
                .unwrap();
        assert!(config.resolve_column("1.1").is_ok());
        assert!(config.resolve_column("2,1").is_ok());
    }

    #[test]
    fn test_rejects_multi_row_template() {
        let text = RESOURCE.replace("E45:AB45", "E45:AB46");
        let result =
            TemplateConfig::from_resource(DocumentType::TravelExpenses, &text, ResourceFormat::Json);
        assert!(matches!(result, Err(SheetfillError::Validation(_))));
    }

    #[test]
    fn test_rejects_column_outside_template_row() {
        let text = RESOURCE.replace(r#""column": "X""#, r#""column": "AC""#);
        let result =
            TemplateConfig::from_resource(DocumentType::TravelExpenses, &text, ResourceFormat::Json);
        assert!(matches!(result, Err(SheetfillError::Validation(_))));
    }

    #[test]
    fn test_rejects_zero_span() {
        let text = RESOURCE.replace(r#""span": 17"#, r#""span": 0"#);
        let result =
            TemplateConfig::from_resource(DocumentType::TravelExpenses, &text, ResourceFormat::Json);
        assert!(matches!(result, Err(SheetfillError::Format(_))));
    }

    #[test]
    fn test_rejects_span_past_last_column() {
        let text = RESOURCE.replace(r#""span": 17"#, r#""span": 4294967295"#);
        let result =
            TemplateConfig::from_resource(DocumentType::TravelExpenses, &text, ResourceFormat::Json);
        assert!(matches!(result, Err(SheetfillError::Format(_))));

        let spec = ColumnSpec {
            column: "F".to_string(),
            start_column_index: 5,
            span: u32::MAX,
        };
        assert_eq!(spec.end_column_index(), u32::MAX);
    }

    #[test]
    fn test_resolution_prefers_mapping_then_literal_then_alias() {
        let config = config();

        let mapped = Record::new()
            .with("concepto", "Hotel")
            .with("descripcion", "ignored");
        assert_eq!(
            config.resolve_attribute("descripcion", &mapped).unwrap().name,
            "concepto"
        );

        let empty_mapping = Record::new()
            .with("concepto", "  ")
            .with("descripcion", "Viáticos");
        assert_eq!(
            config
                .resolve_attribute("descripcion", &empty_mapping)
                .unwrap()
                .value
                .render(),
            "Viáticos"
        );

        let legacy = Record::new().with("detalle", "Taxi");
        assert_eq!(
            config.resolve_attribute("descripcion", &legacy).unwrap().name,
            "detalle"
        );

        assert!(config.resolve_attribute("descripcion", &Record::new()).is_none());
    }
}
