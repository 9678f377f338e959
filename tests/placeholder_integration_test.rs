//! Integration tests for placeholder substitution
//!
//! Covers both document kinds, the one-read/one-write contract on grid
//! sheets and the degrade-instead-of-fail behavior.

use serde_json::json;
use sheetfill::adapters::flowed::InMemoryFlowedStore;
use sheetfill::adapters::grid::{InMemoryGridStore, InjectedFault, MemorySheet, StoreOperation};
use sheetfill::core::placeholder::{
    find_tokens, render_text, DocumentTarget, PlaceholderEngine, PlaceholderValues,
};
use sheetfill::domain::{DocumentId, Record, SheetName};
use std::sync::Arc;

fn document() -> DocumentId {
    DocumentId::new("orden-compra-118").unwrap()
}

fn header_sheet() -> MemorySheet {
    MemorySheet::new(0, "Orden", 30, 12)
        .with_value("B2", "Orden de compra N° {{numero}}")
        .unwrap()
        .with_value("B3", "Proveedor: {{ proveedor }}")
        .unwrap()
        .with_value("B4", "Fecha: {{fecha}} / Ítem {{1,1}}")
        .unwrap()
        .with_value("H4", "{{observaciones}}")
        .unwrap()
        .with_value("B6", "Sin marcadores")
        .unwrap()
}

fn values() -> PlaceholderValues {
    PlaceholderValues::new()
        .with("numero", "118")
        .with("proveedor", "Papelería Central")
        .with("fecha", "2025-03-14")
        .with("1.1", "Resmas")
}

#[tokio::test]
async fn test_grid_tokens_are_replaced_in_one_write() {
    let store = Arc::new(InMemoryGridStore::new());
    store.add_document(document(), vec![header_sheet()]);
    let target = DocumentTarget::grid(store.clone(), document(), None);

    let outcome = PlaceholderEngine::new().substitute(&target, &values()).await;

    assert!(!outcome.is_degraded());
    assert_eq!(outcome.cells_updated, 4);
    assert_eq!(outcome.tokens_replaced, 5);
    assert_eq!(
        outcome.unresolved.iter().collect::<Vec<_>>(),
        vec!["observaciones"]
    );

    let sheet = store.sheet(&document(), None).unwrap();
    assert_eq!(sheet.value_at("B2"), Some("Orden de compra N° 118"));
    assert_eq!(sheet.value_at("B3"), Some("Proveedor: Papelería Central"));
    assert_eq!(sheet.value_at("B4"), Some("Fecha: 2025-03-14 / Ítem Resmas"));
    assert_eq!(sheet.value_at("H4").unwrap_or_default(), "");
    assert_eq!(sheet.value_at("B6"), Some("Sin marcadores"));

    let counters = store.counters();
    assert_eq!(counters.value_reads, 1);
    assert_eq!(counters.value_writes, 1);
}

#[tokio::test]
async fn test_grid_named_sheet() {
    let store = Arc::new(InMemoryGridStore::new());
    store.add_document(
        document(),
        vec![
            MemorySheet::new(1, "Portada", 5, 5)
                .with_value("A1", "{{numero}}")
                .unwrap(),
            header_sheet(),
        ],
    );
    let target = DocumentTarget::grid(
        store.clone(),
        document(),
        Some(SheetName::new("Orden").unwrap()),
    );

    let outcome = PlaceholderEngine::new().substitute(&target, &values()).await;

    assert_eq!(outcome.cells_updated, 4);
    let cover = store.sheet(&document(), Some("Portada")).unwrap();
    assert_eq!(cover.value_at("A1"), Some("{{numero}}"));
}

#[tokio::test]
async fn test_grid_write_failure_degrades() {
    let store = Arc::new(InMemoryGridStore::new());
    store.add_document(document(), vec![header_sheet()]);
    store.inject_fault(StoreOperation::BatchUpdateValues, InjectedFault::Server);
    let target = DocumentTarget::grid(store.clone(), document(), None);

    let outcome = PlaceholderEngine::new().substitute(&target, &values()).await;

    assert!(outcome.is_degraded());
    assert_eq!(outcome.cells_updated, 0);
    let sheet = store.sheet(&document(), None).unwrap();
    assert_eq!(sheet.value_at("B2"), Some("Orden de compra N° {{numero}}"));
}

#[tokio::test]
async fn test_try_substitute_surfaces_missing_document() {
    let store = Arc::new(InMemoryGridStore::new());
    let target = DocumentTarget::grid(store, document(), None);

    let result = PlaceholderEngine::new()
        .try_substitute(&target, &values())
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_flowed_document_replaces_every_occurrence() {
    let store = Arc::new(InMemoryFlowedStore::new());
    store.add_document(
        document(),
        "Señores {{proveedor}}:\nSolicitamos la orden {{numero}}. \
         Atentamente, {{ firmante }}.\nRef. {{numero}}",
    );
    let target = DocumentTarget::flowed(store.clone(), document());

    let outcome = PlaceholderEngine::new().substitute(&target, &values()).await;

    assert_eq!(outcome.tokens_replaced, 4);
    assert_eq!(outcome.cells_updated, 0);
    assert!(outcome.unresolved.contains("firmante"));
    assert_eq!(store.replace_calls(), 1);
    assert_eq!(
        store.text(&document()).unwrap(),
        "Señores Papelería Central:\nSolicitamos la orden 118. Atentamente, .\nRef. 118"
    );
}

#[tokio::test]
async fn test_flowed_without_tokens_makes_no_replace_call() {
    let store = Arc::new(InMemoryFlowedStore::new());
    store.add_document(document(), "Texto fijo");
    let target = DocumentTarget::flowed(store.clone(), document());

    let outcome = PlaceholderEngine::new().substitute(&target, &values()).await;

    assert_eq!(outcome, Default::default());
    assert_eq!(store.replace_calls(), 0);
}

#[test]
fn test_values_from_json_input() {
    let map = json!({ "numero": 118, "proveedor": "Central", "2,5": "x" })
        .as_object()
        .cloned()
        .unwrap();
    let values = PlaceholderValues::from(map);

    assert_eq!(values.get("numero"), Some("118"));
    assert_eq!(values.get("2.5"), Some("x"));
    assert_eq!(values.len(), 3);
}

#[test]
fn test_values_from_record_prefer_formatted() {
    let record = Record::new()
        .with("total", 150000)
        .with("totalFormatted", "$ 150.000");
    let values = PlaceholderValues::from_record(&record);

    assert_eq!(values.get("total"), Some("$ 150.000"));
}

#[test]
fn test_render_and_find_agree() {
    let text = "{{a}} y {{ b }} y {{a}}";
    let tokens = find_tokens(text);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens["{{ b }}"], "b");

    let rendered = render_text(text, &PlaceholderValues::new().with("a", "1"));
    assert_eq!(rendered.text, "1 y  y 1");
    assert_eq!(rendered.tokens_replaced, 3);
    assert_eq!(rendered.unresolved, vec!["b".to_string()]);
}
