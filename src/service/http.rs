//! HTTP object store implementation.
//!
//! Reads result objects from an S3-compatible endpoint using path-style
//! addressing (`{endpoint}/{bucket}/{key}`), e.g. a presigning gateway or a
//! local MinIO. Request signing is left to the gateway.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ByteStream, ObjectStore, ServiceResult};
use crate::error::{RelayError, Result, ServiceError};

/// Default timeout for object reads.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Object store backed by plain HTTP GETs.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: Client,
    endpoint: Url,
    bearer_token: Option<String>,
}

impl HttpObjectStore {
    /// Creates a store for the given endpoint URL.
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RelayError::config(format!("Invalid object store endpoint: {e}")))?;

        if endpoint.cannot_be_a_base() {
            return Err(RelayError::config(format!(
                "Object store endpoint cannot hold paths: {endpoint}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RelayError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            bearer_token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Builds the path-style URL for an object, percent-encoding each segment.
    fn object_url(&self, bucket: &str, key: &str) -> ServiceResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::new("EndpointError", "Endpoint cannot hold paths"))?
            .pop_if_empty()
            .push(bucket)
            .extend(key.split('/'));
        Ok(url)
    }

    /// Maps a non-success HTTP status to a service error.
    fn parse_status(status: StatusCode, body: &str) -> ServiceError {
        let message = if body.is_empty() {
            status.to_string()
        } else {
            format!("{status}: {body}")
        };

        match status {
            StatusCode::NOT_FOUND => ServiceError::new("NoSuchKey", message),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                ServiceError::new("AccessDenied", message)
            }
            StatusCode::TOO_MANY_REQUESTS => ServiceError::new("TooManyRequestsException", message),
            StatusCode::REQUEST_TIMEOUT => ServiceError::new("RequestTimeout", message),
            s if s.is_server_error() => ServiceError::new("ServiceUnavailable", message),
            _ => ServiceError::new("HttpError", message),
        }
    }

    /// Maps a transport failure to a service error.
    fn parse_request_error(error: &reqwest::Error) -> ServiceError {
        if error.is_timeout() {
            ServiceError::new("TimeoutError", format!("Request timed out: {error}"))
        } else if error.is_connect() {
            ServiceError::new("NetworkingError", format!("Failed to connect: {error}"))
        } else {
            ServiceError::new("HttpError", format!("Request failed: {error}"))
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> ServiceResult<ByteStream> {
        let url = self.object_url(bucket, key)?;
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::parse_request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_status(status, &body));
        }

        Ok(response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(|e| Self::parse_request_error(&e))
            .boxed())
    }
}
