//! Fixture mode tests.
//!
//! Loads JSON fixtures the way the binary does and runs queries against them.

use athena_relay::config::Config;
use athena_relay::query::{QueryClient, Records};
use athena_relay::service::{Fixture, QueryState};
use athena_relay::RelayError;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn write_fixture(body: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", body).unwrap();
    file
}

fn client_for(fixture: Fixture) -> QueryClient {
    let (service, store) = fixture.into_collaborators().unwrap();
    QueryClient::builder()
        .execution_service(Arc::new(service))
        .object_store(Arc::new(store))
        .build()
        .unwrap()
}

fn config(toml: &str) -> Config {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml).unwrap();
    Config::load_from_file(file.path()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_fixture_full_object_run() {
    let file = write_fixture(&json!({
        "output_location": "s3://results/run/q.csv",
        "states": ["QUEUED", "RUNNING", "SUCCEEDED"],
        "columns": [
            {"name": "user.name", "type": "varchar"},
            {"name": "user.age", "type": "integer"}
        ],
        "objects": {
            "s3://results/run/q.csv": "\"user.name\",\"user.age\"\n\"ann\",\"41\"\n"
        }
    }));
    let client = client_for(Fixture::load(file.path()).unwrap());
    let config = config("[query]\ndatabase = \"db\"\n[polling]\ninterval_ms = 10\n");

    let request = config.query.to_request("SELECT * FROM users").unwrap();
    let page = client
        .run(
            &request,
            config.polling.interval(),
            &config.fetch.to_options(None),
        )
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&page.records).unwrap(),
        json!([{"user": {"name": "ann", "age": 41.0}}])
    );
}

#[tokio::test(start_paused = true)]
async fn test_fixture_flattened_keys() {
    let file = write_fixture(&json!({
        "output_location": "s3://results/q.csv",
        "columns": [{"name": "a.b", "type": "varchar"}],
        "objects": {"s3://results/q.csv": "a.b\nx\n"}
    }));
    let client = client_for(Fixture::load(file.path()).unwrap());
    let config = config("[query]\ndatabase = \"db\"\n[fetch]\nflatten_nested_keys = true\n");

    let page = client
        .run(
            &config.query.to_request("SELECT 1").unwrap(),
            config.polling.interval(),
            &config.fetch.to_options(None),
        )
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&page.records).unwrap(),
        json!([{"a.b": "x"}])
    );
}

#[tokio::test(start_paused = true)]
async fn test_fixture_paginated_run() {
    let file = write_fixture(&json!({
        "columns": [{"name": "n", "type": "bigint"}],
        "rows": [["1"], ["2"], [null]]
    }));
    let client = client_for(Fixture::load(file.path()).unwrap());
    let config = config("[query]\ndatabase = \"db\"\n[fetch]\npage_size = 2\n");

    let page = client
        .run(
            &config.query.to_request("SELECT n FROM t").unwrap(),
            config.polling.interval(),
            &config.fetch.to_options(None),
        )
        .await
        .unwrap();

    assert!(matches!(page.records, Records::Typed(_)));
    assert_eq!(
        serde_json::to_value(&page).unwrap(),
        json!({"records": [{"n": 1}, {"n": 2}], "next_token": "3"})
    );
}

#[tokio::test(start_paused = true)]
async fn test_fixture_failure_reason() {
    let file = write_fixture(&json!({
        "states": ["RUNNING", "CANCELLED"],
        "failure_reason": "Query was cancelled by user"
    }));
    let client = client_for(Fixture::load(file.path()).unwrap());
    let config = config("[query]\ndatabase = \"db\"\n");

    let err = client
        .run(
            &config.query.to_request("SELECT 1").unwrap(),
            config.polling.interval(),
            &config.fetch.to_options(None),
        )
        .await
        .unwrap_err();

    match err {
        RelayError::QueryFailed { state, reason } => {
            assert_eq!(state, QueryState::Cancelled);
            assert_eq!(reason, "Query was cancelled by user");
        }
        other => panic!("Expected QueryFailed, got {:?}", other),
    }
}

#[test]
fn test_invalid_fixture_is_configuration_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    let err = Fixture::load(file.path()).unwrap_err();
    assert!(matches!(err, RelayError::Configuration(_)));
}
