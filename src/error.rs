//! Error types for athena-relay.
//!
//! Defines the collaborator-level `ServiceError` and the crate-wide
//! `RelayError` enum surfaced by every pipeline stage.

use thiserror::Error;

use crate::decode::ColumnType;
use crate::service::QueryState;

/// Service error codes that indicate the caller should retry unchanged.
const TRANSIENT_CODES: &[&str] = &[
    "ThrottlingException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "InternalServerException",
    "RequestTimeout",
    "EndpointError",
    "NetworkingError",
    "TimeoutError",
];

/// An error reported by one of the remote collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ServiceError {
    /// Service-reported error code (e.g. `ThrottlingException`).
    pub code: String,
    /// Human readable message from the service.
    pub message: String,
    /// Explicit retry hint from the transport layer.
    pub retryable: bool,
}

impl ServiceError {
    /// Creates a service error with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a service error the transport has already flagged as retryable.
    pub fn retryable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            ..Self::new(code, message)
        }
    }

    /// Returns true for rate limiting, throttling and transient network or endpoint failures.
    pub fn is_transient(&self) -> bool {
        self.retryable || TRANSIENT_CODES.contains(&self.code.as_str())
    }
}

/// Main error type for athena-relay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The execution request was rejected with a non-transient error.
    #[error("Submission failed: {0}")]
    FatalSubmission(#[source] ServiceError),

    /// A non-transient collaborator error outside of submission.
    #[error("Service error: {0}")]
    Service(#[source] ServiceError),

    /// The query reached FAILED or CANCELLED.
    #[error("Query {state}: {reason}")]
    QueryFailed { state: QueryState, reason: String },

    /// Results were requested before the query reached a terminal state.
    #[error("Query is still {state}")]
    NotFinished { state: QueryState },

    /// A cell could not be converted to its declared column type.
    #[error("Cannot coerce '{raw}' in column '{column}' to {declared}")]
    TypeCoercion {
        column: String,
        raw: String,
        declared: ColumnType,
    },

    /// Missing collaborators or invalid settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed result payloads (bad UTF-8, schema drift, bad locations).
    #[error("Decode error: {0}")]
    Decode(String),

    /// The retry policy gave up on a transient error.
    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted { attempts: u32, source: ServiceError },

    /// The caller cancelled a pending wait.
    #[error("Operation cancelled")]
    Cancelled,
}

impl RelayError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a query failure from a terminal state and optional reason.
    pub fn query_failed(state: QueryState, reason: Option<&str>) -> Self {
        Self::QueryFailed {
            state,
            reason: reason.unwrap_or_default().to_string(),
        }
    }

    /// Creates a coercion error for a cell.
    pub fn coercion(column: &str, raw: &str, declared: &ColumnType) -> Self {
        Self::TypeCoercion {
            column: column.to_string(),
            raw: raw.to_string(),
            declared: declared.clone(),
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::FatalSubmission(_) => "Submission Error",
            Self::Service(_) => "Service Error",
            Self::QueryFailed { .. } => "Query Failed",
            Self::NotFinished { .. } => "Query Pending",
            Self::TypeCoercion { .. } => "Type Coercion Error",
            Self::Configuration(_) => "Configuration Error",
            Self::Decode(_) => "Decode Error",
            Self::RetriesExhausted { .. } => "Transient Service Error",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Result type alias using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;
