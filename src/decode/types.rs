//! Typed result values for athena-relay.
//!
//! Defines the declared column types and the values cells decode into.

use crate::error::RelayError;
use num_bigint::BigInt;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Declared scalar type of a result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Varchar,
    Boolean,
    BigInt,
    Integer,
    TinyInt,
    SmallInt,
    Int,
    Float,
    Double,
    /// Any other type name; values pass through as strings.
    Other(String),
}

impl ColumnType {
    /// Parses a service type name, case-insensitively.
    pub fn parse(type_name: &str) -> Self {
        match type_name.trim().to_lowercase().as_str() {
            "varchar" => Self::Varchar,
            "boolean" => Self::Boolean,
            "bigint" => Self::BigInt,
            "integer" => Self::Integer,
            "tinyint" => Self::TinyInt,
            "smallint" => Self::SmallInt,
            "int" => Self::Int,
            "float" => Self::Float,
            "double" => Self::Double,
            _ => Self::Other(type_name.to_string()),
        }
    }

    /// Returns the type name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Varchar => "varchar",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Integer => "integer",
            Self::TinyInt => "tinyint",
            Self::SmallInt => "smallint",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::Other(name) => name,
        }
    }

}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypedValue {
    /// Empty or absent cell.
    #[default]
    Null,

    Boolean(bool),

    /// Exact integer of any size (bigint columns).
    BigInt(BigInt),

    /// Double-precision number (all other numeric columns).
    Number(f64),

    String(String),

    /// Nested fields built from dotted CSV headers.
    Record(TypedRecord),
}

impl TypedValue {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::BigInt(i) => i64::try_from(i).ok(),
            _ => None,
        }
    }

    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            TypedValue::BigInt(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&TypedRecord> {
        match self {
            TypedValue::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::Null => serializer.serialize_none(),
            TypedValue::Boolean(b) => serializer.serialize_bool(*b),
            // Wider than 64 bits: exact decimal string.
            TypedValue::BigInt(i) => match (i64::try_from(i), u64::try_from(i)) {
                (Ok(v), _) => serializer.serialize_i64(v),
                (_, Ok(v)) => serializer.serialize_u64(v),
                _ => serializer.collect_str(i),
            },
            TypedValue::Number(n) => serializer.serialize_f64(*n),
            TypedValue::String(s) => serializer.serialize_str(s),
            TypedValue::Record(r) => r.serialize(serializer),
        }
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        TypedValue::Boolean(v)
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        TypedValue::BigInt(BigInt::from(v))
    }
}

impl From<BigInt> for TypedValue {
    fn from(v: BigInt) -> Self {
        TypedValue::BigInt(v)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        TypedValue::Number(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::String(v.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        TypedValue::String(v)
    }
}

/// An ordered mapping from column name to decoded value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedRecord {
    fields: Vec<(String, TypedValue)>,
}

impl TypedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: TypedValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Sets a field under a nested path, creating intermediate records.
    ///
    /// Fails when the path runs through a non-record value, or when the leaf
    /// would overwrite a nested record.
    pub fn insert_path(&mut self, path: &[&str], value: TypedValue) -> Result<(), RelayError> {
        match path {
            [] => Ok(()),
            [name] => {
                if matches!(self.get(name), Some(TypedValue::Record(_))) {
                    return Err(RelayError::decode(format!(
                        "Field '{}' is already a nested record",
                        name
                    )));
                }
                self.insert(*name, value);
                Ok(())
            }
            [head, rest @ ..] => {
                let position = self.fields.iter().position(|(name, _)| name == head);
                let index = match position {
                    Some(index) => index,
                    None => {
                        self.fields
                            .push((head.to_string(), TypedValue::Record(TypedRecord::new())));
                        self.fields.len() - 1
                    }
                };
                match &mut self.fields[index].1 {
                    TypedValue::Record(nested) => nested.insert_path(rest, value),
                    _ => Err(RelayError::decode(format!(
                        "Field '{}' holds a value and cannot contain '{}'",
                        head,
                        rest.join(".")
                    ))),
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Returns the field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, TypedValue)> for TypedRecord {
    fn from_iter<I: IntoIterator<Item = (K, TypedValue)>>(iter: I) -> Self {
        let mut record = TypedRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl Serialize for TypedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A record that could not be decoded, identified by its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    /// Zero-based position among the data records of the page.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl RecordError {
    pub fn new(index: usize, err: &RelayError) -> Self {
        let column = match err {
            RelayError::TypeCoercion { column, .. } => Some(column.clone()),
            _ => None,
        };
        Self {
            index,
            column,
            message: err.to_string(),
        }
    }
}

/// Records decoded from one page, plus the records that failed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decoded {
    pub records: Vec<TypedRecord>,
    pub errors: Vec<RecordError>,
}

impl Decoded {
    pub(crate) fn push(&mut self, index: usize, result: Result<TypedRecord, RelayError>) {
        match result {
            Ok(record) => self.records.push(record),
            Err(err) => {
                warn!(index, error = %err, "Skipping undecodable record");
                self.errors.push(RecordError::new(index, &err));
            }
        }
    }
}
