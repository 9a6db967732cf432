//! Filter predicates carried from the list view's query string to a data source.

use super::value::{Row, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    #[default]
    Eq,
    Ne,
    Like,
    Gt,
    Ge,
    Lt,
    Le,
    /// Inclusive range read from `{field}_start` / `{field}_end`.
    Range,
}

impl FilterOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Like => "like",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Range => "range",
        }
    }
}

/// One filter condition. `value` is the raw query parameter, passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
    /// Upper bound, only set for [`FilterOperator::Range`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<String>,
}

impl FilterPredicate {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            upper: None,
        }
    }

    /// A range predicate; an empty bound is left open.
    pub fn range(
        field: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Range,
            value: start.into(),
            upper: Some(end.into()),
        }
    }

    /// Evaluates the predicate against an in-memory row.
    ///
    /// `like` is a case-insensitive substring match, mirroring SQLite's escaped `LIKE '%v%'`.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(cell) = row.get(&self.field) else {
            return false;
        };
        if cell.is_null() {
            return false;
        }

        match self.operator {
            FilterOperator::Eq => compare(cell, &self.value) == Ordering::Equal,
            FilterOperator::Ne => compare(cell, &self.value) != Ordering::Equal,
            FilterOperator::Like => cell
                .to_string()
                .to_lowercase()
                .contains(&self.value.to_lowercase()),
            FilterOperator::Gt => compare(cell, &self.value) == Ordering::Greater,
            FilterOperator::Ge => compare(cell, &self.value) != Ordering::Less,
            FilterOperator::Lt => compare(cell, &self.value) == Ordering::Less,
            FilterOperator::Le => compare(cell, &self.value) != Ordering::Greater,
            FilterOperator::Range => {
                let above = self.value.is_empty() || compare(cell, &self.value) != Ordering::Less;
                let below = self.upper.as_deref().is_none_or(|upper| {
                    upper.is_empty() || compare(cell, upper) != Ordering::Greater
                });
                above && below
            }
        }
    }
}

fn compare(cell: &Value, raw: &str) -> Ordering {
    match (cell.as_f64(), raw.trim().parse::<f64>()) {
        (Some(left), Ok(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        _ => cell.to_string().as_str().cmp(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::value::row_from;

    fn user() -> Row {
        row_from([
            ("id", Value::Int(7)),
            ("name", Value::from("Jack Ma")),
            ("created_at", Value::from("2024-03-01 10:00:00")),
        ])
    }

    #[test]
    fn like_is_case_insensitive_substring() {
        assert!(FilterPredicate::new("name", FilterOperator::Like, "jack").matches(&user()));
        assert!(!FilterPredicate::new("name", FilterOperator::Like, "jane").matches(&user()));
    }

    #[test]
    fn numeric_comparisons_parse_the_raw_value() {
        assert!(FilterPredicate::new("id", FilterOperator::Eq, "7").matches(&user()));
        assert!(FilterPredicate::new("id", FilterOperator::Gt, "6").matches(&user()));
        assert!(!FilterPredicate::new("id", FilterOperator::Lt, "7").matches(&user()));
        assert!(FilterPredicate::new("id", FilterOperator::Le, "7").matches(&user()));
    }

    #[test]
    fn range_bounds_are_inclusive_and_optional() {
        let open_end = FilterPredicate::range("created_at", "2024-01-01 00:00:00", "");
        assert!(open_end.matches(&user()));

        let before = FilterPredicate::range("created_at", "", "2024-02-01 00:00:00");
        assert!(!before.matches(&user()));
    }

    #[test]
    fn missing_field_never_matches() {
        assert!(!FilterPredicate::new("city", FilterOperator::Ne, "x").matches(&user()));
    }
}
