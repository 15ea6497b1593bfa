//! Paginated result retrieval tests.

use super::common::{client, columns, row};
use athena_relay::decode::TypedValue;
use athena_relay::query::{FetchOptions, PageRequest, Records};
use athena_relay::service::{ExecutionRequest, MockExecutionService, MockObjectStore};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn numbered_rows(count: usize) -> MockExecutionService {
    let rows = (1..=count)
        .map(|n| {
            let id = n.to_string();
            row(&[Some(id.as_str())])
        })
        .collect();
    MockExecutionService::new().with_results(columns(&[("id", "bigint")]), rows)
}

fn ids(records: &Records) -> Vec<i64> {
    match records {
        Records::Typed(records) => records
            .iter()
            .filter_map(|r| r.get("id").and_then(TypedValue::as_i64))
            .collect(),
        other => panic!("Expected typed records, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_walks_all_pages_with_one_catalog_lookup() {
    let (client, service, _) = client(numbered_rows(5), MockObjectStore::new());
    let handle = client
        .submit_query(&ExecutionRequest::new("SELECT id FROM t", "db"))
        .await
        .unwrap();
    let details = client
        .await_completion(&handle, Duration::from_millis(100))
        .await
        .unwrap();
    let fetcher = client.result_fetcher(details);

    let first = fetcher
        .fetch(&FetchOptions::default().paginated(PageRequest::first(2)))
        .await
        .unwrap();
    assert_eq!(ids(&first.records), vec![1, 2]);
    let token = first.next_token.clone().unwrap();

    let second = fetcher
        .fetch(&FetchOptions::default().paginated(PageRequest::after(2, token)))
        .await
        .unwrap();
    assert_eq!(ids(&second.records), vec![3, 4]);
    let token = second.next_token.clone().unwrap();

    let last = fetcher
        .fetch(&FetchOptions::default().paginated(PageRequest::after(2, token)))
        .await
        .unwrap();
    assert_eq!(ids(&last.records), vec![5]);
    assert_eq!(last.next_token, None);

    assert_eq!(
        service.page_calls(),
        vec![
            (1, None),
            (3, None),
            (2, Some("3".to_string())),
            (2, Some("5".to_string())),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_first_page_requests_one_extra_row() {
    let (client, service, _) = client(numbered_rows(3), MockObjectStore::new());

    let page = client
        .run(
            &ExecutionRequest::new("SELECT id FROM t", "db"),
            Duration::from_millis(100),
            &FetchOptions::default().paginated(PageRequest::first(3)),
        )
        .await
        .unwrap();

    assert_eq!(ids(&page.records), vec![1, 2, 3]);
    assert_eq!(page.next_token, None);
    assert_eq!(service.page_calls().last(), Some(&(4, None)));
}

#[tokio::test(start_paused = true)]
async fn test_untyped_page_is_returned_as_is() {
    let (client, service, _) = client(numbered_rows(3), MockObjectStore::new());

    let page = client
        .run(
            &ExecutionRequest::new("SELECT id FROM t", "db"),
            Duration::from_millis(100),
            &FetchOptions::default()
                .raw()
                .paginated(PageRequest::first(2)),
        )
        .await
        .unwrap();

    let Records::Rows(raw) = &page.records else {
        panic!("Expected raw rows, got {:?}", page.records);
    };
    // Header row plus two data rows.
    assert_eq!(raw.rows.len(), 3);
    assert_eq!(raw.rows[0][0].value.as_deref(), Some("id"));
    assert_eq!(raw.next_token.as_deref(), Some("3"));
    assert_eq!(page.next_token.as_deref(), Some("3"));
    assert_eq!(service.page_calls(), vec![(3, None)]);
}

#[tokio::test(start_paused = true)]
async fn test_null_cells_decode_as_null() {
    let service = MockExecutionService::new().with_results(
        columns(&[("id", "bigint"), ("note", "varchar")]),
        vec![row(&[Some("7"), None]), row(&[Some(""), Some("")])],
    );
    let (client, _, _) = client(service, MockObjectStore::new());

    let page = client
        .run(
            &ExecutionRequest::new("SELECT id, note FROM t", "db"),
            Duration::from_millis(100),
            &FetchOptions::default().paginated(PageRequest::first(10)),
        )
        .await
        .unwrap();

    let Records::Typed(records) = page.records else {
        panic!("Expected typed records");
    };
    assert_eq!(records[0].get("id"), Some(&TypedValue::from(7i64)));
    assert_eq!(records[0].get("note"), Some(&TypedValue::Null));
    assert_eq!(records[1].get("id"), Some(&TypedValue::Null));
    assert_eq!(records[1].get("note"), Some(&TypedValue::Null));
}
