//! Integration tests for athena-relay.

pub mod common;
pub mod fixture_test;
pub mod pagination_test;
pub mod pipeline_test;
pub mod retry_test;
