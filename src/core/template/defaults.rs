//! Built-in template configurations
//!
//! Used whenever a document type's resource is missing or unusable, so report
//! generation degrades instead of failing.

use super::schema::{ColumnSpec, TemplateConfig};
use crate::core::coordinates::{index_to_column, CellRange};
use crate::domain::DocumentType;
use std::collections::BTreeMap;

/// Default configuration for a document type
pub fn default_config(document_type: DocumentType) -> TemplateConfig {
    match document_type {
        DocumentType::TravelExpenses => TemplateConfig {
            document_type,
            template_row_range: CellRange::row_span(4, 27, 45), // E45:AB45
            copy_style: true,
            insert_anchor_row: 45,
            columns: columns(&[
                ("id", 4, 1),
                ("descripcion", 5, 17),
                ("cantidad", 23, 1),
                ("valor_unitario", 24, 2),
                ("valor_total", 26, 2),
            ]),
            data_mapping: mapping(&[
                ("id", "id"),
                ("descripcion", "descripcion"),
                ("cantidad", "cantidad"),
                ("valor_unitario", "valorUnitario"),
                ("valor_total", "valorTotal"),
            ]),
            aliases: legacy_aliases(document_type),
            default_value: String::new(),
        },
        DocumentType::PurchaseOrder => TemplateConfig {
            document_type,
            template_row_range: CellRange::row_span(1, 12, 22), // B22:M22
            copy_style: true,
            insert_anchor_row: 22,
            columns: columns(&[
                ("item", 1, 1),
                ("descripcion", 2, 6),
                ("unidad", 8, 1),
                ("cantidad", 9, 1),
                ("valor_unitario", 10, 1),
                ("valor_total", 11, 2),
            ]),
            data_mapping: mapping(&[
                ("item", "item"),
                ("descripcion", "descripcion"),
                ("unidad", "unidadMedida"),
                ("cantidad", "cantidad"),
                ("valor_unitario", "valorUnitario"),
                ("valor_total", "valorTotal"),
            ]),
            aliases: legacy_aliases(document_type),
            default_value: String::new(),
        },
    }
}

/// Legacy attribute names accepted for each logical field, in lookup order
///
/// Upstream records were produced by several generations of forms, so the
/// same value can arrive under different names.
pub fn legacy_aliases(document_type: DocumentType) -> BTreeMap<String, Vec<String>> {
    let common: &[(&str, &[&str])] = &[
        ("descripcion", &["concepto", "detalle", "description", "nombre"]),
        ("cantidad", &["qty", "quantity", "cant"]),
        (
            "valor_unitario",
            &["valorUnitario", "precioUnitario", "precio_unitario", "unitPrice"],
        ),
        ("valor_total", &["valorTotal", "total", "subtotal", "monto"]),
    ];
    let specific: &[(&str, &[&str])] = match document_type {
        DocumentType::TravelExpenses => &[("id", &["item", "numero", "codigo"])],
        DocumentType::PurchaseOrder => &[
            ("item", &["id", "numero", "codigo"]),
            ("unidad", &["unidadMedida", "unit", "um"]),
        ],
    };

    common
        .iter()
        .chain(specific)
        .map(|(field, names)| {
            (
                field.to_string(),
                names.iter().map(|name| name.to_string()).collect(),
            )
        })
        .collect()
}

/// `(field, 0-based lead column, span)` triples
fn columns(specs: &[(&str, u32, u32)]) -> BTreeMap<String, ColumnSpec> {
    specs
        .iter()
        .map(|(field, index, span)| {
            (
                field.to_string(),
                ColumnSpec {
                    column: index_to_column(*index),
                    start_column_index: *index,
                    span: *span,
                },
            )
        })
        .collect()
}

fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(field, attribute)| (field.to_string(), attribute.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        for doc_type in DocumentType::ALL {
            let config = default_config(doc_type);
            assert!(config.validate().is_ok(), "{doc_type} default is invalid");
            assert_eq!(config.document_type, doc_type);
        }
    }

    #[test]
    fn test_travel_expenses_layout() {
        let config = default_config(DocumentType::TravelExpenses);
        assert_eq!(config.insert_anchor_row, 45);
        assert_eq!(config.template_row_range.width(), 24);
        assert_eq!(config.resolve_column("cantidad").unwrap().start_column_index, 23);
        assert_eq!(config.resolve_column("valor_total").unwrap().column, "AA");
        assert_eq!(config.template_row_range.to_string(), "E45:AB45");
        assert_eq!(
            default_config(DocumentType::PurchaseOrder)
                .template_row_range
                .to_string(),
            "B22:M22"
        );
    }

    #[test]
    fn test_default_mapping_targets_are_declared_columns() {
        for doc_type in DocumentType::ALL {
            let config = default_config(doc_type);
            for field in config.data_mapping.keys() {
                assert!(config.columns.contains_key(field), "{field} not declared");
            }
        }
    }
}
