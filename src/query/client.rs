//! High-level query client.
//!
//! Bundles the two collaborators and exposes the submit, await and fetch
//! stages of a query's lifecycle.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{ExecutionPoller, FetchOptions, Page, QuerySubmitter, ResultFetcher};
use crate::error::{RelayError, Result};
use crate::retry::RetryPolicy;
use crate::service::{
    ExecutionDetails, ExecutionHandle, ExecutionRequest, ExecutionService, ObjectStore, QueryState,
};

/// Client for running queries against an execution service.
///
/// Holds no per-query state, so one client can drive many queries
/// concurrently.
#[derive(Clone)]
pub struct QueryClient {
    service: Arc<dyn ExecutionService>,
    store: Arc<dyn ObjectStore>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    /// Starts building a client.
    pub fn builder() -> QueryClientBuilder {
        QueryClientBuilder::default()
    }

    /// Creates a client with the default (unbounded) retry policy.
    pub fn new(service: Arc<dyn ExecutionService>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            service,
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Submits a query, retrying transient errors.
    pub async fn submit_query(&self, request: &ExecutionRequest) -> Result<ExecutionHandle> {
        QuerySubmitter::new(self.service.as_ref(), self.retry)
            .submit(request)
            .await
    }

    /// Submits a query, giving up if `cancel` fires while waiting to retry.
    pub async fn submit_query_with_cancel(
        &self,
        request: &ExecutionRequest,
        cancel: &CancellationToken,
    ) -> Result<ExecutionHandle> {
        QuerySubmitter::new(self.service.as_ref(), self.retry)
            .submit_with_cancel(request, Some(cancel))
            .await
    }

    /// Polls until the query finishes; fails if it ends FAILED or CANCELLED.
    pub async fn await_completion(
        &self,
        handle: &ExecutionHandle,
        poll_interval: Duration,
    ) -> Result<ExecutionDetails> {
        ExecutionPoller::new(self.service.as_ref(), self.retry)
            .await_completion(handle, poll_interval)
            .await
    }

    /// Polls until the query finishes or `cancel` fires.
    pub async fn await_completion_with_cancel(
        &self,
        handle: &ExecutionHandle,
        poll_interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<ExecutionDetails> {
        ExecutionPoller::new(self.service.as_ref(), self.retry)
            .await_completion_with_cancel(handle, poll_interval, Some(cancel))
            .await
    }

    /// Fetches one page of results for a finished query.
    ///
    /// Looks up the execution's status first; use [`result_fetcher`](Self::result_fetcher)
    /// with the details from [`await_completion`](Self::await_completion) to skip that call
    /// and to share one column catalog across pages.
    pub async fn fetch_results(
        &self,
        handle: &ExecutionHandle,
        options: &FetchOptions,
    ) -> Result<Page> {
        let details = self
            .service
            .get_status(handle)
            .await
            .map_err(RelayError::Service)?;

        match details.state() {
            QueryState::Succeeded => self.result_fetcher(details).fetch(options).await,
            state @ (QueryState::Failed | QueryState::Cancelled) => Err(
                RelayError::query_failed(state, details.status.reason.as_deref()),
            ),
            state => Err(RelayError::NotFinished { state }),
        }
    }

    /// Returns a fetcher bound to one finished execution.
    pub fn result_fetcher(&self, details: ExecutionDetails) -> ResultFetcher<'_> {
        ResultFetcher::new(self.service.as_ref(), self.store.as_ref(), details)
    }

    /// Submits a query, waits for it and fetches the first page of results.
    pub async fn run(
        &self,
        request: &ExecutionRequest,
        poll_interval: Duration,
        options: &FetchOptions,
    ) -> Result<Page> {
        let handle = self.submit_query(request).await?;
        let details = self.await_completion(&handle, poll_interval).await?;
        self.result_fetcher(details).fetch(options).await
    }
}

/// Builder for [`QueryClient`].
#[derive(Default)]
pub struct QueryClientBuilder {
    service: Option<Arc<dyn ExecutionService>>,
    store: Option<Arc<dyn ObjectStore>>,
    retry: RetryPolicy,
}

impl QueryClientBuilder {
    pub fn execution_service(mut self, service: Arc<dyn ExecutionService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builds the client; both collaborators are required.
    pub fn build(self) -> Result<QueryClient> {
        let service = self
            .service
            .ok_or_else(|| RelayError::config("An execution service is required"))?;
        let store = self
            .store
            .ok_or_else(|| RelayError::config("An object store is required"))?;

        Ok(QueryClient {
            service,
            store,
            retry: self.retry,
        })
    }
}
