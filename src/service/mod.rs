//! Remote collaborator interfaces for athena-relay.
//!
//! The query-execution service and the object store are modelled as async
//! traits so the pipeline can run against real transports or the in-memory
//! mocks used by tests and fixture mode.

mod http;
mod mock;
mod request;
mod types;

pub use http::{HttpObjectStore, DEFAULT_TIMEOUT_SECS};
pub use mock::{Fixture, MockExecutionService, MockObjectStore};
pub use request::{
    EncryptionConfig, EncryptionOption, ExecutionRequest, DEFAULT_CATALOG, DEFAULT_WORKGROUP,
};
pub use types::{
    ColumnDescriptor, Datum, ExecutionDetails, ExecutionHandle, ExecutionStatistics,
    ExecutionStatus, ObjectLocation, QueryState, ResultsPage, ServiceRow, StatementKind,
};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ServiceError;

/// Result type for collaborator calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Chunked object body as delivered by an object store.
pub type ByteStream = BoxStream<'static, ServiceResult<Vec<u8>>>;

/// Interface of the remote query-execution service.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Starts executing a statement and returns its handle.
    async fn start_execution(&self, request: &ExecutionRequest) -> ServiceResult<ExecutionHandle>;

    /// Returns the current status and metadata for an execution.
    async fn get_status(&self, handle: &ExecutionHandle) -> ServiceResult<ExecutionDetails>;

    /// Returns one page of results, including column metadata.
    ///
    /// The first page of a result set starts with a header row.
    async fn get_results_page(
        &self,
        handle: &ExecutionHandle,
        max_results: usize,
        next_token: Option<&str>,
    ) -> ServiceResult<ResultsPage>;
}

/// Interface of the remote object store holding raw result files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Opens an object for reading.
    async fn get_object(&self, bucket: &str, key: &str) -> ServiceResult<ByteStream>;
}
