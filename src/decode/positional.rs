//! Decoding of positional rows from the paginated results endpoint.

use super::{coerce, ColumnType, Decoded, TypeCatalog, TypedRecord};
use crate::error::{RelayError, Result};
use crate::service::ServiceRow;

/// Decodes positional rows into typed records.
///
/// Column names are looked up in the catalog's reversed order, walking each
/// row from its last cell to its first, so cell `j` always carries column
/// `j`'s name and each record lists its columns last-to-first.
///
/// A row that fails to decode is reported in [`Decoded::errors`] and the
/// remaining rows are still decoded.
pub fn decode_rows(rows: &[ServiceRow], catalog: &TypeCatalog) -> Decoded {
    let reversed: Vec<_> = catalog.iter().rev().collect();
    let mut decoded = Decoded::default();
    for (index, row) in rows.iter().enumerate() {
        decoded.push(index, decode_row(row, &reversed));
    }
    decoded
}

fn decode_row(row: &ServiceRow, reversed: &[(&str, &ColumnType)]) -> Result<TypedRecord> {
    if row.len() > reversed.len() {
        return Err(RelayError::decode(format!(
            "Row has {} cells but the result set declares {} columns",
            row.len(),
            reversed.len()
        )));
    }

    let mut record = TypedRecord::new();
    for (j, datum) in row.iter().enumerate().rev() {
        let (name, declared) = reversed[reversed.len() - 1 - j];
        let value = coerce(name, datum.value.as_deref(), declared)?;
        record.insert(name, value);
    }
    Ok(record)
}
