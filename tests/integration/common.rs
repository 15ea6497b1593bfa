//! Shared helpers for the integration tests.

use athena_relay::query::QueryClient;
use athena_relay::service::{
    ColumnDescriptor, Datum, MockExecutionService, MockObjectStore, ServiceRow,
};
use athena_relay::ServiceError;
use std::sync::Arc;

/// Builds a client over the given mocks, keeping handles for inspection.
pub fn client(
    service: MockExecutionService,
    store: MockObjectStore,
) -> (QueryClient, Arc<MockExecutionService>, Arc<MockObjectStore>) {
    let service = Arc::new(service);
    let store = Arc::new(store);
    let client = QueryClient::builder()
        .execution_service(service.clone())
        .object_store(store.clone())
        .build()
        .expect("both collaborators are set");
    (client, service, store)
}

pub fn columns(defs: &[(&str, &str)]) -> Vec<ColumnDescriptor> {
    defs.iter()
        .map(|(name, type_name)| ColumnDescriptor::new(*name, *type_name))
        .collect()
}

pub fn row(cells: &[Option<&str>]) -> ServiceRow {
    cells
        .iter()
        .map(|cell| Datum::from(cell.map(String::from)))
        .collect()
}

pub fn throttled() -> ServiceError {
    ServiceError::new("ThrottlingException", "Rate exceeded")
}
