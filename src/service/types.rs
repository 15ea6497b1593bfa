//! Wire-level types exchanged with the query service.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::{RelayError, Result};

/// Opaque identifier of one submitted query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    /// Wraps a service-issued execution id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw execution id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Execution state as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    /// Returns the state as the service spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns true once the service will no longer change the state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus the service's explanation for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub state: QueryState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExecutionStatus {
    pub fn new(state: QueryState) -> Self {
        Self {
            state,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Classification of the submitted statement.
///
/// Decides whether results are tabular (DML) or plain text (DDL, UTILITY).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementKind {
    Ddl,
    #[default]
    Dml,
    Utility,
}

impl StatementKind {
    /// Returns true when the result file is line-oriented text rather than CSV.
    pub fn has_text_output(&self) -> bool {
        matches!(self, Self::Ddl | Self::Utility)
    }
}

/// Engine statistics reported alongside a finished execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_execution_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_scanned_bytes: Option<u64>,
}

/// Status and metadata for one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDetails {
    pub handle: ExecutionHandle,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub statement_kind: StatementKind,
    /// Full object location of the result file, e.g. `s3://bucket/path/id.csv`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ExecutionStatistics>,
}

impl ExecutionDetails {
    /// Returns the current state.
    pub fn state(&self) -> QueryState {
        self.status.state
    }
}

/// Name and declared type of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// One cell of a positional row; `value` is unset for SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datum {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Datum {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn null() -> Self {
        Self::default()
    }
}

impl From<Option<String>> for Datum {
    fn from(value: Option<String>) -> Self {
        Self { value }
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::value(value)
    }
}

/// A row as returned by the paginated results endpoint.
pub type ServiceRow = Vec<Datum>;

/// One page from the paginated results endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsPage {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<ServiceRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Bucket and key of a result object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Parses an `s3://bucket/key` location.
    ///
    /// The key is kept exactly as written, without percent-decoding or
    /// splitting off a query or fragment.
    pub fn parse(location: &str) -> Result<Self> {
        let url = Url::parse(location)
            .map_err(|e| RelayError::decode(format!("Invalid output location {location}: {e}")))?;
        if url.scheme() != "s3" {
            return Err(RelayError::decode(format!(
                "Unsupported output location: {location}"
            )));
        }

        let bucket = url.host_str().filter(|bucket| !bucket.is_empty());
        let key = bucket.and_then(|bucket| {
            location
                .split_once("://")
                .and_then(|(_, rest)| rest.strip_prefix(bucket))
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|key| !key.is_empty())
        });

        match (bucket, key) {
            (Some(bucket), Some(key)) => Ok(Self {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            _ => Err(RelayError::decode(format!(
                "Output location has no bucket or object key: {location}"
            ))),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
