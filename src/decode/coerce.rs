//! Conversion of raw result cells into typed values.

use super::{ColumnType, TypedValue};
use crate::error::{RelayError, Result};
use num_bigint::BigInt;

/// Converts a raw cell into a value of its declared type.
///
/// Absent and empty cells are NULL for every type. Bigint cells parse as
/// exact integers of any size; the other numeric types parse as doubles.
pub fn coerce(column: &str, raw: Option<&str>, declared: &ColumnType) -> Result<TypedValue> {
    let raw = match raw {
        None | Some("") => return Ok(TypedValue::Null),
        Some(raw) => raw,
    };

    match declared {
        ColumnType::Varchar | ColumnType::Other(_) => Ok(TypedValue::String(raw.to_string())),
        ColumnType::Boolean => parse_bool(raw)
            .map(TypedValue::Boolean)
            .ok_or_else(|| RelayError::coercion(column, raw, declared)),
        ColumnType::BigInt => parse_bigint(raw)
            .map(TypedValue::BigInt)
            .ok_or_else(|| RelayError::coercion(column, raw, declared)),
        ColumnType::Integer
        | ColumnType::TinyInt
        | ColumnType::SmallInt
        | ColumnType::Int
        | ColumnType::Float
        | ColumnType::Double => raw
            .trim()
            .parse::<f64>()
            .map(TypedValue::Number)
            .map_err(|_| RelayError::coercion(column, raw, declared)),
    }
}

/// Accepts an optional sign followed by ASCII digits, with no size limit.
fn parse_bigint(raw: &str) -> Option<BigInt> {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
