//! Equality filters shared by the backend store, the tenant gateway and the
//! portal's backend client.
//!
//! A [`Filter`] is a conjunction of `column = value` predicates plus an
//! optional ordering and row limit. JSON `null` means `IS NULL`. Values are
//! compared by their text rendering so that a UUID column and a UUID string
//! compare equal regardless of the storage engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Unsupported filter value for column '{0}'")]
    UnsupportedValue(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, rename = "where")]
    pub where_clause: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.where_clause.insert(column.into(), value);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order { column: column.into(), ascending });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.where_clause.get(column)
    }

    /// Overwrites (or adds) a predicate in place.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.where_clause.insert(column.into(), value);
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        for (column, value) in &self.where_clause {
            if !is_valid_identifier(column) {
                return Err(FilterError::InvalidColumn(column.clone()));
            }
            if matches!(value, Value::Array(_) | Value::Object(_)) {
                return Err(FilterError::UnsupportedValue(column.clone()));
            }
        }
        if let Some(order) = &self.order {
            if !is_valid_identifier(&order.column) {
                return Err(FilterError::InvalidColumn(order.column.clone()));
            }
        }
        Ok(())
    }

    /// Evaluates the predicates against a JSON row.
    pub fn matches(&self, row: &Value) -> bool {
        self.where_clause.iter().all(|(column, expected)| {
            let actual = row.get(column).unwrap_or(&Value::Null);
            match (as_text(expected), as_text(actual)) {
                (None, None) => true,
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        })
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`, at most 63 characters.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Text rendering used for equality. `None` for JSON null.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Ordering used for `ORDER BY` emulation: numbers numerically, everything
/// else by text, nulls last.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => as_text(a).cmp(&as_text(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_by_text_rendering() {
        let filter = Filter::new().eq("instance_id", "abc").eq("units", 3);
        assert!(filter.matches(&json!({ "instance_id": "abc", "units": 3, "other": 1 })));
        assert!(!filter.matches(&json!({ "instance_id": "abd", "units": 3 })));
        assert!(!filter.matches(&json!({ "units": 3 })));
    }

    #[test]
    fn null_predicate_means_missing_or_null() {
        let filter = Filter::new().eq("status", Value::Null);
        assert!(filter.matches(&json!({ "status": null })));
        assert!(filter.matches(&json!({})));
        assert!(!filter.matches(&json!({ "status": "Done" })));
    }

    #[test]
    fn rejects_injection_in_column_names() {
        assert!(Filter::new().eq("instance_id", "x").validate().is_ok());
        assert_eq!(
            Filter::new().eq("id; DROP TABLE users", 1).validate(),
            Err(FilterError::InvalidColumn("id; DROP TABLE users".to_string()))
        );
        assert!(Filter::new().order_by("created at", true).validate().is_err());
        assert!(Filter::new().eq("tags", json!(["a"])).validate().is_err());
    }

    #[test]
    fn deserializes_wire_shape() {
        let filter: Filter = serde_json::from_value(json!({
            "where": { "status": "Done" },
            "order": { "column": "created_at" },
            "limit": 10
        }))
        .unwrap();
        assert_eq!(filter.get("status"), Some(&json!("Done")));
        assert_eq!(filter.order, Some(Order { column: "created_at".into(), ascending: true }));
        assert_eq!(filter.limit, Some(10));
    }

    #[test]
    fn nulls_sort_last() {
        let mut values = vec![json!(null), json!(2), json!(10)];
        values.sort_by(compare_values);
        assert_eq!(values, vec![json!(2), json!(10), json!(null)]);
    }
}
