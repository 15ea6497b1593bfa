//! Execution request value object.

use serde::{Deserialize, Serialize};

/// Default data catalog when the caller does not name one.
pub const DEFAULT_CATALOG: &str = "AwsDataCatalog";

/// Default workgroup when the caller does not name one.
pub const DEFAULT_WORKGROUP: &str = "primary";

/// Server-side or client-side encryption mode for result files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncryptionOption {
    SseS3,
    SseKms,
    CseKms,
}

/// Encryption settings applied to the query's result files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionConfig {
    pub option: EncryptionOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key: Option<String>,
}

/// A statement to execute, together with where and how to run it.
///
/// Immutable once built; the `with_*` methods consume and return the request.
/// Unset optionals are left out of the serialized form entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    statement: String,
    database: String,
    catalog: String,
    workgroup: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encryption: Option<EncryptionConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<String>,
}

impl ExecutionRequest {
    /// Creates a request against the default catalog and workgroup.
    pub fn new(statement: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            database: database.into(),
            catalog: DEFAULT_CATALOG.to_string(),
            workgroup: DEFAULT_WORKGROUP.to_string(),
            output_location: None,
            encryption: None,
            parameters: Vec::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = catalog.into();
        self
    }

    pub fn with_workgroup(mut self, workgroup: impl Into<String>) -> Self {
        self.workgroup = workgroup.into();
        self
    }

    /// Overrides the workgroup's result location. Empty strings are ignored.
    pub fn with_output_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        self.output_location = (!location.is_empty()).then_some(location);
        self
    }

    pub fn with_encryption(mut self, encryption: EncryptionConfig) -> Self {
        self.encryption = Some(encryption);
        self
    }

    /// Binds positional execution parameters (`?` placeholders).
    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn workgroup(&self) -> &str {
        &self.workgroup
    }

    pub fn output_location(&self) -> Option<&str> {
        self.output_location.as_deref()
    }

    pub fn encryption(&self) -> Option<&EncryptionConfig> {
        self.encryption.as_ref()
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}
