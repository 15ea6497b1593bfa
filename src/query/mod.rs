//! Query lifecycle for athena-relay.
//!
//! Submission, completion polling and result retrieval, plus the
//! `QueryClient` that strings them together.

pub mod client;
pub mod fetcher;
pub mod poller;
pub mod submitter;

pub use client::{QueryClient, QueryClientBuilder};
pub use fetcher::{FetchOptions, Page, PageRequest, Records, ResultFetcher};
pub use poller::ExecutionPoller;
pub use submitter::QuerySubmitter;
