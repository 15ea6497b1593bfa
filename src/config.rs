//! Configuration management for athena-relay.
//!
//! Handles loading configuration from TOML files and environment variables.
//! Every section is optional; a missing file yields the defaults.

use crate::error::{RelayError, Result};
use crate::query::{FetchOptions, PageRequest};
use crate::retry::RetryPolicy;
use crate::service::{EncryptionConfig, ExecutionRequest, DEFAULT_CATALOG, DEFAULT_WORKGROUP};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for athena-relay.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where and how statements run.
    #[serde(default)]
    pub query: QueryConfig,

    /// Completion polling and retry caps.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Result retrieval defaults.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Object storage gateway for raw result files.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

/// Execution context for submitted statements.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryConfig {
    pub database: Option<String>,

    /// Data catalog; the service default when unset.
    pub catalog: Option<String>,

    /// Workgroup; the service default when unset.
    pub workgroup: Option<String>,

    /// Result location (`s3://bucket/prefix/`). Omitted from requests when unset.
    pub output_location: Option<String>,

    pub encryption: Option<EncryptionConfig>,
}

impl QueryConfig {
    /// Applies environment variables (ATHENA_DATABASE, etc.) as defaults.
    pub fn apply_env_defaults(&mut self) {
        if self.database.is_none() {
            self.database = std::env::var("ATHENA_DATABASE").ok();
        }
        if self.catalog.is_none() {
            self.catalog = std::env::var("ATHENA_CATALOG").ok();
        }
        if self.workgroup.is_none() {
            self.workgroup = std::env::var("ATHENA_WORKGROUP").ok();
        }
        if self.output_location.is_none() {
            self.output_location = std::env::var("ATHENA_OUTPUT_LOCATION").ok();
        }
    }

    /// Builds an execution request for `statement` from these settings.
    pub fn to_request(&self, statement: &str) -> Result<ExecutionRequest> {
        let database = self
            .database
            .as_deref()
            .ok_or_else(|| RelayError::config("Database name is required"))?;

        let mut request = ExecutionRequest::new(statement, database)
            .with_catalog(self.catalog.as_deref().unwrap_or(DEFAULT_CATALOG))
            .with_workgroup(self.workgroup.as_deref().unwrap_or(DEFAULT_WORKGROUP));
        if let Some(location) = &self.output_location {
            request = request.with_output_location(location.as_str());
        }
        if let Some(encryption) = &self.encryption {
            request = request.with_encryption(encryption.clone());
        }
        Ok(request)
    }
}

/// Completion polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between status checks, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Give up after this many consecutive transient failures.
    pub max_attempts: Option<u32>,

    /// Give up once transient failures have lasted this long.
    pub max_elapsed_secs: Option<u64>,
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: None,
            max_elapsed_secs: None,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Returns the retry policy; unbounded unless a cap is configured.
    pub fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::unbounded();
        if let Some(attempts) = self.max_attempts {
            policy = policy.with_max_attempts(attempts);
        }
        if let Some(secs) = self.max_elapsed_secs {
            policy = policy.with_max_elapsed(Duration::from_secs(secs));
        }
        policy
    }
}

/// Result retrieval defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Rows per page; reads the whole result file when unset.
    pub page_size: Option<usize>,

    #[serde(default = "default_true")]
    pub typed: bool,

    #[serde(default = "default_true")]
    pub ignore_empty_lines: bool,

    #[serde(default)]
    pub flatten_nested_keys: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: None,
            typed: true,
            ignore_empty_lines: true,
            flatten_nested_keys: false,
        }
    }
}

impl FetchConfig {
    /// Converts to fetch options, continuing from `next_token` when given.
    pub fn to_options(&self, next_token: Option<&str>) -> FetchOptions {
        let pagination = self.page_size.map(|page_size| PageRequest {
            page_size,
            next_token: next_token.map(String::from),
        });
        FetchOptions {
            pagination,
            typed: self.typed,
            ignore_empty_lines: self.ignore_empty_lines,
            flatten_nested_keys: self.flatten_nested_keys,
        }
    }
}

/// Object storage gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Base URL of an S3-compatible endpoint (path-style).
    pub endpoint: Option<String>,

    /// Bearer token sent with every request.
    pub bearer_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    crate::service::DEFAULT_TIMEOUT_SECS
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            bearer_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("athena-relay")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| RelayError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            RelayError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Fills unset query settings from the environment.
    pub fn apply_env_defaults(&mut self) {
        self.query.apply_env_defaults();
    }
}
