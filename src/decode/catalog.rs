//! Column type catalog for one result set.

use tracing::debug;

use super::ColumnType;
use crate::error::{RelayError, Result};
use crate::service::{ColumnDescriptor, ExecutionHandle, ExecutionService};

/// Column name to declared type, in the service's reported column order.
///
/// Built once per execution and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCatalog {
    columns: Vec<(String, ColumnType)>,
}

impl TypeCatalog {
    /// Reads the column descriptors of an execution's result set.
    ///
    /// Requests a single row so only the metadata is transferred.
    pub async fn resolve(
        service: &dyn ExecutionService,
        handle: &ExecutionHandle,
    ) -> Result<Self> {
        let page = service
            .get_results_page(handle, 1, None)
            .await
            .map_err(RelayError::Service)?;

        let catalog = Self::from_descriptors(&page.columns);
        debug!("Resolved {} column types for {}", catalog.len(), handle);
        Ok(catalog)
    }

    pub fn from_descriptors(columns: &[ColumnDescriptor]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|column| (column.name.clone(), ColumnType::parse(&column.type_name)))
                .collect(),
        }
    }

    /// Returns the declared type of a column.
    pub fn get(&self, name: &str) -> Option<&ColumnType> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, declared)| declared)
    }

    /// Returns the column names in service order.
    pub fn names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &ColumnType)> {
        self.columns
            .iter()
            .map(|(name, declared)| (name.as_str(), declared))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Checks that a later page reports the same columns as this catalog.
    ///
    /// Pages that omit column metadata are accepted.
    pub fn ensure_matches(&self, columns: &[ColumnDescriptor]) -> Result<()> {
        if columns.is_empty() {
            return Ok(());
        }

        let same = columns.len() == self.columns.len()
            && columns
                .iter()
                .zip(self.names())
                .all(|(column, name)| column.name == name);

        if same {
            Ok(())
        } else {
            Err(RelayError::decode(format!(
                "Result columns changed between pages: expected [{}], got [{}]",
                self.names().collect::<Vec<_>>().join(", "),
                columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }
}

impl<K: Into<String>> FromIterator<(K, ColumnType)> for TypeCatalog {
    fn from_iter<I: IntoIterator<Item = (K, ColumnType)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, declared)| (name.into(), declared))
                .collect(),
        }
    }
}
