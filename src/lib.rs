//! athena-relay - submit, poll and decode analytic queries.
//!
//! This library exposes the core modules for use by the binary and
//! integration tests.

pub mod config;
pub mod decode;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod query;
pub mod retry;
pub mod service;

pub use error::{RelayError, Result, ServiceError};
pub use normalize::normalize_keys;
pub use query::{FetchOptions, Page, PageRequest, QueryClient, Records};
pub use retry::RetryPolicy;
