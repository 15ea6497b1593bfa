//! Result retrieval for finished executions.
//!
//! Picks between reading the raw result object and calling the paginated
//! results endpoint, then hands the payload to the matching decoder.

use futures::TryStreamExt;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::decode::{
    decode_delimited, decode_lines, decode_rows, raw_lines, Decoded, DelimitedOptions,
    LineRecord, RecordError, TypeCatalog, TypedRecord,
};
use crate::error::{RelayError, Result};
use crate::service::{
    ExecutionDetails, ExecutionHandle, ExecutionService, ObjectLocation, ObjectStore, ResultsPage,
};

/// Which page of a paginated result set to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of data rows wanted.
    pub page_size: usize,
    /// Token from the previous page; `None` for the first page.
    pub next_token: Option<String>,
}

impl PageRequest {
    pub fn first(page_size: usize) -> Self {
        Self {
            page_size,
            next_token: None,
        }
    }

    pub fn after(page_size: usize, next_token: impl Into<String>) -> Self {
        Self {
            page_size,
            next_token: Some(next_token.into()),
        }
    }

    /// Rows to request from the service.
    ///
    /// The service puts a header row at the top of the first page only.
    pub fn max_results(&self) -> usize {
        self.page_size + usize::from(self.next_token.is_none())
    }
}

/// Caller options for result retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Use the paginated results endpoint instead of the raw result object.
    pub pagination: Option<PageRequest>,
    /// Decode into typed records; otherwise return the undecoded payload.
    pub typed: bool,
    pub ignore_empty_lines: bool,
    pub flatten_nested_keys: bool,
}

impl FetchOptions {
    pub fn paginated(mut self, request: PageRequest) -> Self {
        self.pagination = Some(request);
        self
    }

    pub fn raw(mut self) -> Self {
        self.typed = false;
        self
    }

    fn delimited(&self) -> DelimitedOptions {
        DelimitedOptions {
            ignore_empty_lines: self.ignore_empty_lines,
            flatten_nested_keys: self.flatten_nested_keys,
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        let delimited = DelimitedOptions::default();
        Self {
            pagination: None,
            typed: true,
            ignore_empty_lines: delimited.ignore_empty_lines,
            flatten_nested_keys: delimited.flatten_nested_keys,
        }
    }
}

/// Records of one fetched page, in the shape the retrieval path produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Records {
    /// Typed records from tabular results.
    Typed(Vec<TypedRecord>),
    /// An undecoded page from the paginated endpoint.
    Rows(ResultsPage),
    /// Undecoded lines of the raw result object.
    Lines(Vec<String>),
    /// Key/value records from DDL and utility statements.
    KeyValues(Vec<LineRecord>),
}

impl Records {
    /// Number of records on the page.
    pub fn len(&self) -> usize {
        match self {
            Records::Typed(records) => records.len(),
            Records::Rows(page) => page.rows.len(),
            Records::Lines(lines) => lines.len(),
            Records::KeyValues(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One page of results. `next_token` is `None` on the final page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub records: Records,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    /// Records of this page that failed to decode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RecordError>,
}

impl Page {
    pub fn new(records: Records, next_token: Option<String>) -> Self {
        Self {
            records,
            next_token,
            errors: Vec::new(),
        }
    }

    fn typed(decoded: Decoded, next_token: Option<String>) -> Self {
        Self {
            records: Records::Typed(decoded.records),
            next_token,
            errors: decoded.errors,
        }
    }
}

/// Fetches results for one finished execution.
///
/// The column catalog is resolved at most once per fetcher, so reuse one
/// fetcher to walk all pages of a result set.
pub struct ResultFetcher<'a> {
    service: &'a dyn ExecutionService,
    store: &'a dyn ObjectStore,
    details: ExecutionDetails,
    catalog: OnceCell<TypeCatalog>,
}

impl<'a> ResultFetcher<'a> {
    pub fn new(
        service: &'a dyn ExecutionService,
        store: &'a dyn ObjectStore,
        details: ExecutionDetails,
    ) -> Self {
        Self {
            service,
            store,
            details,
            catalog: OnceCell::new(),
        }
    }

    pub fn handle(&self) -> &ExecutionHandle {
        &self.details.handle
    }

    /// Returns the column catalog, resolving it on first use.
    pub async fn catalog(&self) -> Result<&TypeCatalog> {
        self.catalog
            .get_or_try_init(|| TypeCatalog::resolve(self.service, &self.details.handle))
            .await
    }

    /// Fetches one page of results.
    ///
    /// DDL and utility statements always read the raw result object as
    /// key/value lines. Otherwise a pagination request goes to the results
    /// endpoint and anything else reads the whole result object.
    pub async fn fetch(&self, options: &FetchOptions) -> Result<Page> {
        if self.details.statement_kind.has_text_output() {
            let text = self.read_output().await?;
            return Ok(Page::new(Records::KeyValues(decode_lines(&text)), None));
        }

        if let Some(request) = &options.pagination {
            return self.fetch_page(request, options.typed).await;
        }

        if options.typed {
            let catalog = self.catalog().await?;
            let text = self.read_output().await?;
            let decoded = decode_delimited(&text, catalog, &options.delimited())?;
            Ok(Page::typed(decoded, None))
        } else {
            let text = self.read_output().await?;
            let lines = raw_lines(&text, options.ignore_empty_lines);
            Ok(Page::new(Records::Lines(lines), None))
        }
    }

    async fn fetch_page(&self, request: &PageRequest, typed: bool) -> Result<Page> {
        let catalog = if typed { Some(self.catalog().await?) } else { None };

        let max_results = request.max_results();
        debug!(
            "Fetching {} rows of {} (token: {:?})",
            max_results, self.details.handle, request.next_token
        );

        let page = self
            .service
            .get_results_page(
                &self.details.handle,
                max_results,
                request.next_token.as_deref(),
            )
            .await
            .map_err(RelayError::Service)?;
        let next_token = page.next_token.clone();

        let Some(catalog) = catalog else {
            return Ok(Page::new(Records::Rows(page), next_token));
        };

        catalog.ensure_matches(&page.columns)?;
        let rows = if request.next_token.is_none() {
            page.rows.get(1..).unwrap_or(&[])
        } else {
            &page.rows[..]
        };

        Ok(Page::typed(decode_rows(rows, catalog), next_token))
    }

    /// Reads the whole result object as UTF-8 text.
    async fn read_output(&self) -> Result<String> {
        let location = self.details.output_location.as_deref().ok_or_else(|| {
            RelayError::decode(format!(
                "Query {} reported no output location",
                self.details.handle
            ))
        })?;
        let location = ObjectLocation::parse(location)?;
        debug!("Reading result object {}", location);

        let bytes: Vec<u8> = self
            .store
            .get_object(&location.bucket, &location.key)
            .await
            .map_err(RelayError::Service)?
            .try_concat()
            .await
            .map_err(RelayError::Service)?;

        String::from_utf8(bytes).map_err(|e| {
            RelayError::decode(format!("Result object {location} is not valid UTF-8: {e}"))
        })
    }
}
