//! End-to-end tests against a mocked spreadsheet REST API
//!
//! Runs the materializer and the placeholder engine through `HttpGridStore`
//! and checks the calls that reach the wire.

use mockito::{Matcher, Server, ServerGuard};
use sheetfill::adapters::grid::{GridStore, HttpGridStore, RetryPolicy, RetryingGridStore};
use sheetfill::config::{secret_string, StoreConfig};
use sheetfill::core::materializer::RowMaterializer;
use sheetfill::core::placeholder::{DocumentTarget, PlaceholderEngine, PlaceholderValues};
use sheetfill::core::template::default_config;
use sheetfill::domain::{
    DocumentId, DocumentType, MaterializationStage, MaterializationStep, Record, SheetfillError,
};
use std::sync::Arc;
use std::time::Duration;

fn store_for(server: &ServerGuard) -> HttpGridStore {
    let config = StoreConfig {
        base_url: server.url(),
        access_token: Some(secret_string("test-token".to_string())),
        ..Default::default()
    };
    HttpGridStore::new(&config).unwrap()
}

fn document() -> DocumentId {
    DocumentId::new("sheet123").unwrap()
}

// Template row 45 sits at index 46 once two rows are inserted above it
const METADATA: &str = r#"{"sheets":[{
    "properties":{"sheetId":9,"title":"Hoja 1","gridProperties":{"rowCount":60,"columnCount":30}},
    "merges":[
        {"sheetId":9,"startRowIndex":46,"endRowIndex":47,"startColumnIndex":5,"endColumnIndex":22},
        {"sheetId":9,"startRowIndex":46,"endRowIndex":47,"startColumnIndex":24,"endColumnIndex":26},
        {"sheetId":9,"startRowIndex":43,"endRowIndex":44,"startColumnIndex":5,"endColumnIndex":22}
    ]}]}"#;

fn records() -> Vec<Record> {
    vec![
        Record::new()
            .with("id", "8.1")
            .with("descripcion", "Viáticos")
            .with("cantidad", 3),
        Record::new()
            .with("id", "8.2")
            .with("descripcion", "Transporte")
            .with("cantidad", 1),
    ]
}

#[tokio::test]
async fn test_materialize_over_http() {
    let mut server = Server::new_async().await;

    let metadata = server
        .mock("GET", "/v4/spreadsheets/sheet123")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(METADATA)
        .expect(2)
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/v4/spreadsheets/sheet123:batchUpdate")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("insertDimension".to_string()),
            Matcher::Regex(r#""startIndex":44\}"#.to_string()),
            Matcher::Regex(r#""endIndex":46"#.to_string()),
        ]))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;
    let styles = server
        .mock("POST", "/v4/spreadsheets/sheet123:batchUpdate")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("copyPaste".to_string()),
            Matcher::Regex("PASTE_FORMAT".to_string()),
            Matcher::Regex("mergeCells".to_string()),
        ]))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;
    let values = server
        .mock("POST", "/v4/spreadsheets/sheet123/values:batchUpdate")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""valueInputOption":"USER_ENTERED""#.to_string()),
            Matcher::Regex(r#"\{"range":"E45","values":\[\["8.1"\]\]\}"#.to_string()),
            Matcher::Regex(r#"\{"range":"F46","values":\[\["Transporte"\]\]\}"#.to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"totalUpdatedCells": 10}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(store_for(&server));
    let config = default_config(DocumentType::TravelExpenses);
    let summary = RowMaterializer::new(store)
        .materialize(&document(), None, &config, &records())
        .await
        .unwrap();

    metadata.assert_async().await;
    insert.assert_async().await;
    styles.assert_async().await;
    values.assert_async().await;

    assert_eq!(summary.stage, MaterializationStage::Done);
    assert_eq!(summary.rows_inserted, 2);
    assert_eq!(summary.merges_created, 4);
    assert_eq!(summary.cells_written, 10);
}

#[tokio::test]
async fn test_missing_document_fails_before_any_write() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v4/spreadsheets/sheet123")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("Requested entity was not found.")
        .create_async()
        .await;
    let writes = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = RowMaterializer::new(Arc::new(store_for(&server)))
        .materialize(
            &document(),
            None,
            &default_config(DocumentType::TravelExpenses),
            &records(),
        )
        .await
        .unwrap_err();

    writes.assert_async().await;
    match err {
        SheetfillError::Materialization { step, source } => {
            assert_eq!(step, MaterializationStep::InsertRows);
            assert!(matches!(*source, SheetfillError::NotFound(_)));
        }
        other => panic!("expected materialization error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_quota_is_retried_then_surfaced() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("GET", "/v4/spreadsheets/sheet123")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("retry-after", "1")
        .expect(3)
        .create_async()
        .await;

    let policy = RetryPolicy {
        max_retries: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        multiplier: 2.0,
        jitter: false,
    };
    let store = RetryingGridStore::new(store_for(&server), policy);

    let err = store.sheet_metadata(&document(), None).await.unwrap_err();

    limited.assert_async().await;
    assert!(matches!(err, SheetfillError::QuotaExceeded(_)));
}

#[tokio::test]
async fn test_placeholders_over_http() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v4/spreadsheets/sheet123")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"sheets":[{"properties":{"sheetId":0,"title":"Orden",
                "gridProperties":{"rowCount":4,"columnCount":3}}}]}"#,
        )
        .create_async()
        .await;
    let read = server
        .mock(
            "GET",
            Matcher::Regex(r"^/v4/spreadsheets/sheet123/values/.+".to_string()),
        )
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"values":[["Orden {{numero}}", "fijo"], [], ["", "", "{{firma}}"]]}"#)
        .expect(1)
        .create_async()
        .await;
    let write = server
        .mock("POST", "/v4/spreadsheets/sheet123/values:batchUpdate")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""range":"'Orden'!A1","values":\[\["Orden 118"\]\]"#.to_string()),
            Matcher::Regex(r#""range":"'Orden'!C3","values":\[\[""\]\]"#.to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"totalUpdatedCells": 2}"#)
        .expect(1)
        .create_async()
        .await;

    let target = DocumentTarget::grid(Arc::new(store_for(&server)), document(), None);
    let values = PlaceholderValues::new().with("numero", "118");
    let outcome = PlaceholderEngine::new().substitute(&target, &values).await;

    read.assert_async().await;
    write.assert_async().await;
    assert!(!outcome.is_degraded());
    assert_eq!(outcome.cells_updated, 2);
    assert!(outcome.unresolved.contains("firma"));
}
