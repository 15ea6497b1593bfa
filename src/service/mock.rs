//! Mock collaborators for testing and fixture mode.
//!
//! Provides scripted in-memory implementations of the execution service and
//! the object store.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{
    ByteStream, ColumnDescriptor, Datum, ExecutionDetails, ExecutionHandle, ExecutionRequest,
    ExecutionService, ExecutionStatus, ObjectLocation, ObjectStore, QueryState, ResultsPage,
    ServiceResult, ServiceRow, StatementKind,
};
use crate::error::{RelayError, Result, ServiceError};

/// Default chunk size for mock object bodies.
const DEFAULT_CHUNK_SIZE: usize = 64;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A scripted execution service.
///
/// Submissions and status checks replay their scripts in order. Once the
/// status script is exhausted the last reported status repeats. Results are
/// paginated over the configured rows, with a header row in front like the
/// real service.
pub struct MockExecutionService {
    submissions: Mutex<VecDeque<ServiceResult<ExecutionHandle>>>,
    statuses: Mutex<VecDeque<ServiceResult<ExecutionStatus>>>,
    last_status: Mutex<ExecutionStatus>,
    statement_kind: StatementKind,
    output_location: Option<String>,
    columns: Vec<ColumnDescriptor>,
    rows: Vec<ServiceRow>,
    requests: Mutex<Vec<ExecutionRequest>>,
    page_calls: Mutex<Vec<(usize, Option<String>)>>,
    status_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl MockExecutionService {
    /// Creates a mock whose queries succeed immediately with no rows.
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(ExecutionStatus::new(QueryState::Succeeded)),
            statement_kind: StatementKind::Dml,
            output_location: None,
            columns: Vec::new(),
            rows: Vec::new(),
            requests: Mutex::new(Vec::new()),
            page_calls: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Queues submission outcomes; generated handles follow once exhausted.
    pub fn with_submissions<I>(self, outcomes: I) -> Self
    where
        I: IntoIterator<Item = ServiceResult<ExecutionHandle>>,
    {
        lock(&self.submissions).extend(outcomes);
        self
    }

    /// Queues status check outcomes.
    pub fn with_statuses<I>(self, outcomes: I) -> Self
    where
        I: IntoIterator<Item = ServiceResult<ExecutionStatus>>,
    {
        lock(&self.statuses).extend(outcomes);
        self
    }

    pub fn with_statement_kind(mut self, kind: StatementKind) -> Self {
        self.statement_kind = kind;
        self
    }

    pub fn with_output_location(mut self, location: impl Into<String>) -> Self {
        self.output_location = Some(location.into());
        self
    }

    /// Sets the result schema and data rows (without the header row).
    pub fn with_results(mut self, columns: Vec<ColumnDescriptor>, rows: Vec<ServiceRow>) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    /// Returns every request passed to `start_execution`, in order.
    pub fn submitted_requests(&self) -> Vec<ExecutionRequest> {
        lock(&self.requests).clone()
    }

    /// Returns `(max_results, next_token)` for every results page call.
    pub fn page_calls(&self) -> Vec<(usize, Option<String>)> {
        lock(&self.page_calls).clone()
    }

    /// Returns the number of status checks made so far.
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn header_row(&self) -> ServiceRow {
        self.columns
            .iter()
            .map(|column| Datum::value(column.name.clone()))
            .collect()
    }
}

impl Default for MockExecutionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionService for MockExecutionService {
    async fn start_execution(&self, request: &ExecutionRequest) -> ServiceResult<ExecutionHandle> {
        lock(&self.requests).push(request.clone());

        if let Some(outcome) = lock(&self.submissions).pop_front() {
            return outcome;
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(ExecutionHandle::new(format!("mock-query-{id}")))
    }

    async fn get_status(&self, handle: &ExecutionHandle) -> ServiceResult<ExecutionDetails> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let status = match lock(&self.statuses).pop_front() {
            Some(Ok(status)) => {
                *lock(&self.last_status) = status.clone();
                status
            }
            Some(Err(e)) => return Err(e),
            None => lock(&self.last_status).clone(),
        };

        Ok(ExecutionDetails {
            handle: handle.clone(),
            status,
            statement_kind: self.statement_kind,
            output_location: self.output_location.clone(),
            statistics: None,
        })
    }

    async fn get_results_page(
        &self,
        _handle: &ExecutionHandle,
        max_results: usize,
        next_token: Option<&str>,
    ) -> ServiceResult<ResultsPage> {
        lock(&self.page_calls).push((max_results, next_token.map(String::from)));

        let start = match next_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                ServiceError::new("InvalidRequestException", format!("Bad token: {token}"))
            })?,
            None => 0,
        };

        let all_rows: Vec<ServiceRow> = std::iter::once(self.header_row())
            .chain(self.rows.iter().cloned())
            .collect();
        let end = (start + max_results).min(all_rows.len());
        let rows = all_rows.get(start..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_token = (end < all_rows.len()).then(|| end.to_string());

        Ok(ResultsPage {
            columns: self.columns.clone(),
            rows,
            next_token,
        })
    }
}

/// An in-memory object store.
pub struct MockObjectStore {
    objects: HashMap<(String, String), Vec<u8>>,
    errors: Mutex<VecDeque<ServiceError>>,
    chunk_size: usize,
    reads: Mutex<Vec<ObjectLocation>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            errors: Mutex::new(VecDeque::new()),
            chunk_size: DEFAULT_CHUNK_SIZE,
            reads: Mutex::new(Vec::new()),
        }
    }

    /// Stores an object body.
    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.objects.insert((bucket.into(), key.into()), body.into());
        self
    }

    /// Makes the next `get_object` calls fail with these errors.
    pub fn with_errors<I>(self, errors: I) -> Self
    where
        I: IntoIterator<Item = ServiceError>,
    {
        lock(&self.errors).extend(errors);
        self
    }

    /// Sets how many bytes each streamed chunk carries.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Returns every location read so far.
    pub fn reads(&self) -> Vec<ObjectLocation> {
        lock(&self.reads).clone()
    }
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> ServiceResult<ByteStream> {
        lock(&self.reads).push(ObjectLocation {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });

        if let Some(error) = lock(&self.errors).pop_front() {
            return Err(error);
        }

        let body = self
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| {
                ServiceError::new("NoSuchKey", format!("s3://{bucket}/{key} does not exist"))
            })?;

        let chunks: Vec<ServiceResult<Vec<u8>>> = body
            .chunks(self.chunk_size)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();
        Ok(futures::stream::iter(chunks).boxed())
    }
}

/// A JSON description of one query's lifecycle for fixture mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub statement_kind: StatementKind,
    #[serde(default)]
    pub output_location: Option<String>,
    /// States reported by successive status checks.
    #[serde(default)]
    pub states: Vec<QueryState>,
    /// Reason attached to FAILED or CANCELLED states.
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
    /// Object bodies keyed by `s3://bucket/key`.
    #[serde(default)]
    pub objects: HashMap<String, String>,
}

impl Fixture {
    /// Loads a fixture from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::config(format!("Failed to read fixture {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            RelayError::config(format!("Invalid fixture {}: {e}", path.display()))
        })
    }

    /// Builds the mock collaborators described by this fixture.
    pub fn into_collaborators(self) -> Result<(MockExecutionService, MockObjectStore)> {
        let reason = self.failure_reason;
        let statuses = self.states.into_iter().map(|state| {
            let status = ExecutionStatus::new(state);
            Ok(match (&reason, state) {
                (Some(reason), QueryState::Failed | QueryState::Cancelled) => {
                    status.with_reason(reason.clone())
                }
                _ => status,
            })
        });

        let rows = self
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(Datum::from).collect())
            .collect();

        let mut service = MockExecutionService::new()
            .with_statuses(statuses)
            .with_statement_kind(self.statement_kind)
            .with_results(self.columns, rows);
        if let Some(location) = self.output_location {
            service = service.with_output_location(location);
        }

        let mut store = MockObjectStore::new();
        for (location, body) in self.objects {
            let location = ObjectLocation::parse(&location)?;
            store = store.with_object(location.bucket, location.key, body);
        }

        Ok((service, store))
    }
}
