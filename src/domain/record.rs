//! Input records
//!
//! A [`Record`] is an opaque attribute map produced upstream for every
//! dynamic row. Values are either text or numbers; the same logical field may
//! show up under several legacy attribute names, which is resolved later by
//! the template configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value of a record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Text(String),
    Number(Number),
    Null,
}

impl RecordValue {
    /// Renders the value as cell text
    ///
    /// Numbers are not rounded; integral floats drop their trailing `.0`.
    pub fn render(&self) -> String {
        match self {
            RecordValue::Text(text) => text.clone(),
            RecordValue::Number(number) => render_number(number),
            RecordValue::Null => String::new(),
        }
    }

    /// True for null and for whitespace-only text
    pub fn is_empty(&self) -> bool {
        match self {
            RecordValue::Text(text) => text.trim().is_empty(),
            RecordValue::Number(_) => false,
            RecordValue::Null => true,
        }
    }
}

fn render_number(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", value as i64)
        }
        Some(value) => value.to_string(),
        None => number.to_string(),
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::Text(value.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        RecordValue::Text(value)
    }
}

impl From<i64> for RecordValue {
    fn from(value: i64) -> Self {
        RecordValue::Number(Number::from(value))
    }
}

impl From<i32> for RecordValue {
    fn from(value: i32) -> Self {
        RecordValue::Number(Number::from(value))
    }
}

impl From<f64> for RecordValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(RecordValue::Number)
            .unwrap_or(RecordValue::Null)
    }
}

impl From<Value> for RecordValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RecordValue::Null,
            Value::String(text) => RecordValue::Text(text),
            Value::Number(number) => RecordValue::Number(number),
            Value::Bool(flag) => RecordValue::Text(flag.to_string()),
            nested @ (Value::Array(_) | Value::Object(_)) => RecordValue::Text(nested.to_string()),
        }
    }
}

impl From<&RecordValue> for Value {
    fn from(value: &RecordValue) -> Self {
        match value {
            RecordValue::Text(text) => Value::String(text.clone()),
            RecordValue::Number(number) => Value::Number(number.clone()),
            RecordValue::Null => Value::Null,
        }
    }
}

/// One input record (one dynamic row)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record {
    attributes: BTreeMap<String, RecordValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RecordValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RecordValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&RecordValue> {
        self.attributes.get(name)
    }

    /// Returns the attribute only when present and non-empty
    pub fn get_non_empty(&self, name: &str) -> Option<&RecordValue> {
        self.get(name).filter(|value| !value.is_empty())
    }

    /// Like [`Self::get_non_empty`], also returning the stored attribute name
    pub fn entry_non_empty(&self, name: &str) -> Option<(&str, &RecordValue)> {
        self.attributes
            .get_key_value(name)
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Upstream pre-formatted display text for an attribute, if supplied
    ///
    /// Looks for `<name>Formatted` and then `<name>_formatted`.
    pub fn formatted(&self, name: &str) -> Option<&str> {
        [format!("{name}Formatted"), format!("{name}_formatted")]
            .iter()
            .filter_map(|key| self.get_non_empty(key))
            .find_map(|value| match value {
                RecordValue::Text(text) => Some(text.as_str()),
                _ => None,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RecordValue)> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            attributes: map
                .into_iter()
                .map(|(name, value)| (name, RecordValue::from(value)))
                .collect(),
        }
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        record
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value)))
            .collect()
    }
}

/// Normalizes a field or placeholder key
///
/// Trims surrounding whitespace and rewrites a comma between two digits into
/// a dot, so `"1,1"` and `"1.1"` name the same key.
///
/// ```
/// use sheetfill::domain::record::normalize_key;
///
/// assert_eq!(normalize_key(" 1,1 "), "1.1");
/// assert_eq!(normalize_key("valor_total"), "valor_total");
/// assert_eq!(normalize_key("a,b"), "a,b");
/// ```
pub fn normalize_key(key: &str) -> String {
    let chars: Vec<char> = key.trim().chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let between_digits = i > 0
                && i + 1 < chars.len()
                && chars[i - 1].is_ascii_digit()
                && chars[i + 1].is_ascii_digit();
            if c == ',' && between_digits {
                '.'
            } else {
                c
            }
        })
        .collect()
}
