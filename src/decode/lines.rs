//! Decoding of line-oriented text results (DDL and utility statements).

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Key used for lines that carry no tab-separated key.
pub const ROW_KEY: &str = "row";

/// A single-entry record taken from one line of text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub key: String,
    pub value: String,
}

impl LineRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Serialize for LineRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.value)?;
        map.end()
    }
}

/// Parses key/value text output.
///
/// `key<TAB>value` lines become `{key: value}` with the value trimmed; other
/// lines become `{"row": line}` trimmed. Blank lines are dropped.
pub fn decode_lines(text: &str) -> Vec<LineRecord> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once('\t') {
            Some((key, value)) => LineRecord::new(key, value.trim()),
            None => LineRecord::new(ROW_KEY, line.trim()),
        })
        .collect()
}

/// Splits text into lines without interpreting them.
pub fn raw_lines(text: &str, ignore_empty_lines: bool) -> Vec<String> {
    text.lines()
        .filter(|line| !(ignore_empty_lines && line.trim().is_empty()))
        .map(String::from)
        .collect()
}
