//! Typed cell values exchanged between data sources and the admin views.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// A single row, keyed by field name.
pub type Row = BTreeMap<String, Value>;

/// Builds a [`Row`] from `(field, value)` pairs.
pub fn row_from<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(field, value)| (field.into(), value.into()))
        .collect()
}

/// A cell value. Serialized as a plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `Null` and empty text are both treated as "no value".
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Bool(value) => Some(i64::from(*value)),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Key equality across storage classes: `Int(1)` matches `Text("1")`.
    pub fn matches_key(&self, other: &Self) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        self == other || self.to_string() == other.to_string()
    }

    /// Total order used for in-memory sorting: nulls first, then numbers, then text.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
            _ => self.rank().cmp(&other.rank()).then_with(|| match (self, other) {
                (Self::Text(left), Self::Text(right)) => left.cmp(right),
                _ => Ordering::Equal,
            }),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bool(value) => Some(f64::from(u8::from(*value))),
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Declared storage type of a column or form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Int,
    Tinyint,
    Float,
    Varchar,
    Text,
    Date,
    Timestamp,
    Bool,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl DataType {
    /// Converts raw form input into a typed value.
    ///
    /// Empty input becomes `Null` for every non-text type.
    pub fn coerce(self, raw: &str) -> Result<Value, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() && !matches!(self, Self::Varchar | Self::Text) {
            return Ok(Value::Null);
        }

        match self {
            Self::Int | Self::Tinyint => trimmed
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| format!("`{trimmed}` is not an integer: {e}")),
            Self::Float => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("`{trimmed}` is not a number: {e}")),
            Self::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Ok(Value::Bool(true)),
                "0" | "false" | "off" | "no" => Ok(Value::Bool(false)),
                other => Err(format!("`{other}` is not a boolean")),
            },
            Self::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|date| Value::Text(date.format("%Y-%m-%d").to_string()))
                .map_err(|e| format!("`{trimmed}` is not a date (YYYY-MM-DD): {e}")),
            Self::Timestamp => parse_timestamp(trimmed)
                .map(|ts| Value::Text(ts.format(TIMESTAMP_FORMAT).to_string()))
                .ok_or_else(|| format!("`{trimmed}` is not a timestamp")),
            Self::Varchar | Self::Text => Ok(Value::Text(raw.to_owned())),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|ts| ts.naive_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_json_scalars() {
        let row = row_from([
            ("id", Value::Int(10)),
            ("title", Value::from("hello")),
            ("score", Value::Float(1.5)),
            ("missing", Value::Null),
        ]);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 10, "title": "hello", "score": 1.5, "missing": null})
        );
    }

    #[test]
    fn empty_covers_null_and_empty_text_only() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(!Value::from(" ").is_empty());
        assert!(!Value::Int(0).is_empty());
        assert!(!Value::Bool(false).is_empty());
    }

    #[test]
    fn key_matching_crosses_storage_classes() {
        assert!(Value::Int(3).matches_key(&Value::from("3")));
        assert!(!Value::Int(3).matches_key(&Value::Int(4)));
        assert!(!Value::Null.matches_key(&Value::Null));
    }

    #[test]
    fn sort_orders_numbers_numerically() {
        let mut values = vec![Value::Int(10), Value::Float(2.5), Value::Null, Value::Int(3)];
        values.sort_by(Value::sort_cmp);
        assert_eq!(
            values,
            vec![Value::Null, Value::Float(2.5), Value::Int(3), Value::Int(10)]
        );
    }

    #[test]
    fn coerce_parses_declared_types() {
        assert_eq!(DataType::Int.coerce(" 42 "), Ok(Value::Int(42)));
        assert_eq!(DataType::Tinyint.coerce(""), Ok(Value::Null));
        assert_eq!(DataType::Bool.coerce("on"), Ok(Value::Bool(true)));
        assert_eq!(DataType::Varchar.coerce(""), Ok(Value::from("")));
        assert_eq!(
            DataType::Date.coerce("2024-02-29"),
            Ok(Value::from("2024-02-29"))
        );
        assert_eq!(
            DataType::Timestamp.coerce("2024-01-02T03:04:05Z"),
            Ok(Value::from("2024-01-02 03:04:05"))
        );
        assert!(DataType::Int.coerce("abc").is_err());
        assert!(DataType::Date.coerce("2023-02-30").is_err());
    }
}
