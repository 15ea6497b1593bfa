//! Decoding of delimited-text result files.
//!
//! Result files are comma-separated with a header row. Fields may be quoted
//! with `"`, in which case they can hold commas, newlines and doubled quotes.

use serde::{Deserialize, Serialize};

use super::{coerce, ColumnType, Decoded, TypeCatalog, TypedRecord};
use crate::error::{RelayError, Result};

/// Type assumed for headers missing from the catalog.
static UNDECLARED: ColumnType = ColumnType::Varchar;

/// Caller options for delimited-text decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimitedOptions {
    /// Skip blank lines instead of emitting all-NULL records.
    pub ignore_empty_lines: bool,
    /// Keep dotted headers (`a.b`) as literal keys instead of nesting them.
    pub flatten_nested_keys: bool,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            ignore_empty_lines: true,
            flatten_nested_keys: false,
        }
    }
}

/// One physical record of the file, split into fields.
#[derive(Debug, PartialEq)]
struct RawRecord {
    fields: Vec<String>,
    quoted: bool,
}

impl RawRecord {
    fn is_blank(&self) -> bool {
        !self.quoted && self.fields.len() == 1 && self.fields[0].trim().is_empty()
    }
}

/// Decodes a delimited-text result file into typed records.
///
/// Cells are coerced with the catalog type of their header; headers the
/// catalog does not know are treated as varchar. Cells beyond the header are
/// named `field<N>` (1-based). A record that fails to decode is reported in
/// [`Decoded::errors`] and the rest of the file is still decoded.
pub fn decode_delimited(
    text: &str,
    catalog: &TypeCatalog,
    options: &DelimitedOptions,
) -> Result<Decoded> {
    let mut records = split_records(text)?.into_iter();

    let header = match records.by_ref().find(|record| !record.is_blank()) {
        Some(header) => header.fields,
        None => return Ok(Decoded::default()),
    };
    if !options.flatten_nested_keys {
        check_nesting(&header)?;
    }

    let mut decoded = Decoded::default();
    let data = records.filter(|record| !(options.ignore_empty_lines && record.is_blank()));
    for (index, record) in data.enumerate() {
        decoded.push(index, decode_record(&record.fields, &header, catalog, options));
    }
    Ok(decoded)
}

/// Rejects headers that are both a value and the parent of a nested header.
fn check_nesting(header: &[String]) -> Result<()> {
    for name in header {
        for (end, _) in name.match_indices('.') {
            let parent = &name[..end];
            if header.iter().any(|other| other == parent) {
                return Err(RelayError::decode(format!(
                    "Header '{}' conflicts with nested header '{}'",
                    parent, name
                )));
            }
        }
    }
    Ok(())
}

fn decode_record(
    fields: &[String],
    header: &[String],
    catalog: &TypeCatalog,
    options: &DelimitedOptions,
) -> Result<TypedRecord> {
    let mut record = TypedRecord::new();
    let width = header.len().max(fields.len());

    for i in 0..width {
        let name = match header.get(i) {
            Some(name) => name.clone(),
            None => format!("field{}", i + 1),
        };
        let declared = catalog.get(&name).unwrap_or(&UNDECLARED);
        let value = coerce(&name, fields.get(i).map(String::as_str), declared)?;

        if !options.flatten_nested_keys && name.contains('.') {
            let path: Vec<&str> = name.split('.').collect();
            record.insert_path(&path, value)?;
        } else {
            record.insert(name, value);
        }
    }

    Ok(record)
}

/// Splits text into records, honouring quotes across line breaks.
fn split_records(text: &str) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                quoted = true;
            }
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push(RawRecord {
                    fields: std::mem::take(&mut fields),
                    quoted,
                });
                quoted = false;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(RelayError::decode("Unterminated quoted field in result file"));
    }

    if !field.is_empty() || !fields.is_empty() || quoted {
        fields.push(field);
        records.push(RawRecord { fields, quoted });
    }

    Ok(records)
}
