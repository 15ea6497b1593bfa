//! End-to-end query pipeline tests.
//!
//! Submit, await and fetch against the mock collaborators.

use super::common::{client, columns, row};
use athena_relay::decode::TypedValue;
use athena_relay::query::{FetchOptions, PageRequest, Records};
use athena_relay::service::{
    ExecutionRequest, ExecutionStatus, MockExecutionService, MockObjectStore, QueryState,
    StatementKind,
};
use athena_relay::RelayError;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn test_ddl_output_decodes_as_key_values() {
    let service = MockExecutionService::new()
        .with_statement_kind(StatementKind::Ddl)
        .with_output_location("s3://results/ddl/q.txt")
        .with_statuses([
            Ok(ExecutionStatus::new(QueryState::Running)),
            Ok(ExecutionStatus::new(QueryState::Succeeded)),
        ]);
    let store = MockObjectStore::new().with_object("results", "ddl/q.txt", "col1\tval1\nval2\n");
    let (client, _, _) = client(service, store);

    let page = client
        .run(
            &ExecutionRequest::new("SHOW TABLES", "db"),
            INTERVAL,
            &FetchOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&page).unwrap(),
        json!({"records": [{"col1": "val1"}, {"row": "val2"}]})
    );
}

#[tokio::test(start_paused = true)]
async fn test_ddl_ignores_pagination() {
    let service = MockExecutionService::new()
        .with_statement_kind(StatementKind::Utility)
        .with_output_location("s3://results/q.txt");
    let store = MockObjectStore::new().with_object("results", "q.txt", "done\n");
    let (client, service, _) = client(service, store);

    let page = client
        .run(
            &ExecutionRequest::new("MSCK REPAIR TABLE t", "db"),
            INTERVAL,
            &FetchOptions::default().paginated(PageRequest::first(10)),
        )
        .await
        .unwrap();

    assert!(matches!(page.records, Records::KeyValues(ref r) if r.len() == 1));
    assert!(service.page_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_positional_row_keeps_bigint_precision() {
    let service = MockExecutionService::new().with_results(
        columns(&[("a", "bigint"), ("b", "boolean")]),
        vec![row(&[Some("9007199254740993"), Some("false")])],
    );
    let (client, _, _) = client(service, MockObjectStore::new());

    let page = client
        .run(
            &ExecutionRequest::new("SELECT a, b FROM t", "db"),
            INTERVAL,
            &FetchOptions::default().paginated(PageRequest::first(10)),
        )
        .await
        .unwrap();

    let Records::Typed(records) = page.records else {
        panic!("Expected typed records, got {:?}", page.records);
    };
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(record.get("b"), Some(&TypedValue::Boolean(false)));
    assert_eq!(record.get("a"), Some(&TypedValue::from(9007199254740993i64)));
    assert_eq!(page.next_token, None);
}

#[tokio::test(start_paused = true)]
async fn test_full_object_typed_decoding() {
    let service = MockExecutionService::new()
        .with_output_location("s3://results/q.csv")
        .with_results(
            columns(&[("name", "varchar"), ("score", "double"), ("active", "boolean")]),
            Vec::new(),
        );
    let store = MockObjectStore::new().with_object(
        "results",
        "q.csv",
        "\"name\",\"score\",\"active\"\n\"ann\",\"1.5\",\"true\"\n\"bob\",\"\",\"FALSE\"\n",
    );
    let (client, _, _) = client(service, store);

    let page = client
        .run(
            &ExecutionRequest::new("SELECT * FROM t", "db"),
            INTERVAL,
            &FetchOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&page.records).unwrap(),
        json!([
            {"name": "ann", "score": 1.5, "active": true},
            {"name": "bob", "score": null, "active": false}
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn test_full_object_untyped_lines() {
    let service = MockExecutionService::new().with_output_location("s3://results/q.csv");
    let store = MockObjectStore::new().with_object("results", "q.csv", "\"a\"\n\n\"1\"\n");
    let (client, service, _) = client(service, store);

    let page = client
        .run(
            &ExecutionRequest::new("SELECT a FROM t", "db"),
            INTERVAL,
            &FetchOptions::default().raw(),
        )
        .await
        .unwrap();

    assert_eq!(
        page.records,
        Records::Lines(vec!["\"a\"".to_string(), "\"1\"".to_string()])
    );
    // Untyped reads never need the column catalog.
    assert!(service.page_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unset_output_location_is_omitted() {
    let (client, service, _) = client(MockExecutionService::new(), MockObjectStore::new());

    let request = ExecutionRequest::new("SELECT 1", "db").with_output_location("");
    client.submit_query(&request).await.unwrap();

    let submitted = service.submitted_requests();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].output_location(), None);
    let wire = serde_json::to_value(&submitted[0]).unwrap();
    assert!(wire.get("outputLocation").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_query_surfaces_reason() {
    let service = MockExecutionService::new().with_statuses([
        Ok(ExecutionStatus::new(QueryState::Queued)),
        Ok(ExecutionStatus::new(QueryState::Failed).with_reason("TABLE_NOT_FOUND: t")),
    ]);
    let (client, _, _) = client(service, MockObjectStore::new());

    let err = client
        .run(
            &ExecutionRequest::new("SELECT * FROM t", "db"),
            INTERVAL,
            &FetchOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Query FAILED: TABLE_NOT_FOUND: t");
    assert_eq!(err.category(), "Query Failed");
}

#[tokio::test(start_paused = true)]
async fn test_coercion_error_names_column_and_keeps_other_rows() {
    let service = MockExecutionService::new().with_results(
        columns(&[("n", "integer"), ("ok", "boolean")]),
        vec![
            row(&[Some("1"), Some("true")]),
            row(&[Some("not-a-number"), Some("true")]),
            row(&[Some("3"), Some("false")]),
        ],
    );
    let (client, _, _) = client(service, MockObjectStore::new());

    let page = client
        .run(
            &ExecutionRequest::new("SELECT n, ok FROM t", "db"),
            INTERVAL,
            &FetchOptions::default().paginated(PageRequest::first(5)),
        )
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&page).unwrap(),
        json!({
            "records": [{"ok": true, "n": 1.0}, {"ok": false, "n": 3.0}],
            "errors": [{
                "index": 1,
                "column": "n",
                "message": "Cannot coerce 'not-a-number' in column 'n' to integer"
            }]
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_conflicting_nested_headers_fail_the_page() {
    let service = MockExecutionService::new()
        .with_output_location("s3://results/q.csv")
        .with_results(columns(&[("a", "varchar"), ("a.b", "varchar")]), Vec::new());
    let store = MockObjectStore::new().with_object("results", "q.csv", "a,a.b
x,y
");
    let (client, _, _) = client(service, store);

    let err = client
        .run(
            &ExecutionRequest::new("SELECT * FROM t", "db"),
            INTERVAL,
            &FetchOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Decode(_)));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_fetch_is_idempotent() {
    let service = MockExecutionService::new().with_results(
        columns(&[("id", "int"), ("label", "varchar")]),
        vec![row(&[Some("1"), Some("x")]), row(&[Some("2"), None])],
    );
    let (client, _, _) = client(service, MockObjectStore::new());
    let handle = client
        .submit_query(&ExecutionRequest::new("SELECT id, label FROM t", "db"))
        .await
        .unwrap();
    let options = FetchOptions::default().paginated(PageRequest::first(10));

    let first = client.fetch_results(&handle, &options).await.unwrap();
    let second = client.fetch_results(&handle, &options).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.records.len(), 2);
}
