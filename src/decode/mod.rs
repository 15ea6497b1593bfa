//! Result decoding for athena-relay.
//!
//! Turns the three raw result shapes (positional rows, delimited text and
//! key/value lines) into records, coercing cells by their declared types.

mod catalog;
mod coerce;
mod delimited;
mod lines;
mod positional;
mod types;

pub use catalog::TypeCatalog;
pub use coerce::coerce;
pub use delimited::{decode_delimited, DelimitedOptions};
pub use lines::{decode_lines, raw_lines, LineRecord, ROW_KEY};
pub use positional::decode_rows;
pub use types::{ColumnType, Decoded, RecordError, TypedRecord, TypedValue};
