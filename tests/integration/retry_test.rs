//! Transient error handling across the query lifecycle.

use super::common::{client, columns, row, throttled};
use athena_relay::query::{FetchOptions, PageRequest, QueryClient};
use athena_relay::service::{
    ExecutionHandle, ExecutionRequest, ExecutionStatus, MockExecutionService, MockObjectStore,
    QueryState,
};
use athena_relay::{RelayError, RetryPolicy, ServiceError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_three_throttles_then_success() {
    let service = MockExecutionService::new().with_submissions([
        Err(throttled()),
        Err(throttled()),
        Err(throttled()),
        Ok(ExecutionHandle::new("query-42")),
    ]);
    let (client, service, _) = client(service, MockObjectStore::new());
    let start = Instant::now();

    let handle = client
        .submit_query(&ExecutionRequest::new("SELECT 1", "db"))
        .await
        .unwrap();

    assert_eq!(handle.as_str(), "query-42");
    assert_eq!(service.submitted_requests().len(), 4);
    assert!(start.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_retryable_flag_is_honoured() {
    let service = MockExecutionService::new().with_submissions([
        Err(ServiceError::retryable("SlowDown", "Reduce your request rate")),
        Ok(ExecutionHandle::new("q")),
    ]);
    let (client, _, _) = client(service, MockObjectStore::new());

    let handle = client
        .submit_query(&ExecutionRequest::new("SELECT 1", "db"))
        .await
        .unwrap();
    assert_eq!(handle.as_str(), "q");
}

#[tokio::test(start_paused = true)]
async fn test_fatal_submission_keeps_service_error() {
    let service = MockExecutionService::new().with_submissions([Err(ServiceError::new(
        "AccessDeniedException",
        "Not authorized to use workgroup",
    ))]);
    let (client, _, _) = client(service, MockObjectStore::new());

    let err = client
        .submit_query(&ExecutionRequest::new("SELECT 1", "db"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Submission Error");
    let source = std::error::Error::source(&err)
        .map(ToString::to_string)
        .unwrap_or_default();
    assert_eq!(source, "AccessDeniedException: Not authorized to use workgroup");
}

#[tokio::test(start_paused = true)]
async fn test_polling_survives_transient_errors() {
    let service = MockExecutionService::new()
        .with_statuses([
            Ok(ExecutionStatus::new(QueryState::Queued)),
            Err(throttled()),
            Err(ServiceError::new("ServiceUnavailable", "try later")),
            Ok(ExecutionStatus::new(QueryState::Running)),
            Ok(ExecutionStatus::new(QueryState::Succeeded)),
        ])
        .with_results(columns(&[("x", "int")]), vec![row(&[Some("1")])]);
    let (client, service, _) = client(service, MockObjectStore::new());

    let page = client
        .run(
            &ExecutionRequest::new("SELECT x FROM t", "db"),
            Duration::from_millis(500),
            &FetchOptions::default().paginated(PageRequest::first(10)),
        )
        .await
        .unwrap();

    assert_eq!(page.records.len(), 1);
    assert_eq!(service.status_calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_capped_policy_gives_up() {
    let service = Arc::new(
        MockExecutionService::new().with_submissions([
            Err(throttled()),
            Err(throttled()),
            Err(throttled()),
        ]),
    );
    let client = QueryClient::builder()
        .execution_service(service.clone())
        .object_store(Arc::new(MockObjectStore::new()))
        .retry_policy(RetryPolicy::unbounded().with_max_attempts(3))
        .build()
        .unwrap();

    let err = client
        .submit_query(&ExecutionRequest::new("SELECT 1", "db"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(service.submitted_requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_abandons_polling() {
    let service = MockExecutionService::new()
        .with_statuses([Ok(ExecutionStatus::new(QueryState::Running))]);
    let (client, service, _) = client(service, MockObjectStore::new());
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        canceller.cancel();
    });

    let err = client
        .await_completion_with_cancel(&ExecutionHandle::new("q"), Duration::from_secs(1), &token)
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Cancelled));
    let calls = service.status_calls();
    assert!((5..=6).contains(&calls), "unexpected status calls: {calls}");
}
