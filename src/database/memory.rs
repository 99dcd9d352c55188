use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::tables;
use super::store::{ensure_object, Row, Store, StoreError};
use crate::filter::{compare_values, Filter};

const KNOWN_TABLES: [&str; 5] = [
    tables::ACCOUNTS,
    tables::USERS,
    tables::TASKS,
    tables::MANUSCRIPTS,
    tables::SALES_DATA,
];

/// In-process store with the same observable semantics as the Postgres
/// schema: generated `id`/`created_at`, column defaults and unique emails.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Row>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_table(table: &str) -> Result<(), StoreError> {
        if KNOWN_TABLES.contains(&table) {
            Ok(())
        } else {
            Err(StoreError::UnknownTable(table.to_string()))
        }
    }

    pub(crate) fn column_defaults(table: &str) -> Vec<(&'static str, Value)> {
        match table {
            tables::ACCOUNTS => vec![("confirmed", json!(false))],
            tables::USERS => vec![("theme_preference", json!("modern"))],
            tables::TASKS => vec![("status", json!("To-Do"))],
            tables::MANUSCRIPTS => vec![("status", json!("Draft")), ("kdp_format", json!("6x9"))],
            _ => vec![],
        }
    }

    fn unique_columns(table: &str) -> &'static [&'static str] {
        match table {
            tables::ACCOUNTS | tables::USERS => &["id", "email"],
            _ => &["id"],
        }
    }

    fn violates_unique(existing: &[Row], candidate: &Map<String, Value>, table: &str, skip: Option<usize>) -> Option<String> {
        for column in Self::unique_columns(table) {
            let Some(value) = candidate.get(*column).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = existing
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip)
                .any(|(_, row)| row.get(*column) == Some(value));
            if clash {
                return Some(format!("{}.{}", table, column));
            }
        }
        None
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select_many(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        Self::check_table(table)?;
        filter.validate()?;

        let guard = self.tables.read().await;
        let mut rows: Vec<Row> = guard
            .get(table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &filter.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending { ordering } else { ordering.reverse() }
            });
        }
        if let Some(limit) = filter.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        Self::check_table(table)?;

        let mut guard = self.tables.write().await;
        let existing = guard.entry(table.to_string()).or_default();
        let mut staged: Vec<Row> = Vec::with_capacity(rows.len());

        for row in rows {
            let mut object = ensure_object(&row, "inserted row")?.clone();
            object
                .entry("id")
                .or_insert_with(|| json!(Uuid::new_v4()));
            object
                .entry("created_at")
                .or_insert_with(|| json!(Utc::now().to_rfc3339()));
            for (column, value) in Self::column_defaults(table) {
                let slot = object.entry(column).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = value;
                }
            }

            let mut visible = existing.clone();
            visible.extend(staged.iter().cloned());
            if let Some(constraint) = Self::violates_unique(&visible, &object, table, None) {
                return Err(StoreError::Conflict(constraint));
            }
            staged.push(Value::Object(object));
        }

        existing.extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<Vec<Row>, StoreError> {
        Self::check_table(table)?;
        filter.validate()?;
        let patch = ensure_object(&patch, "patch")?.clone();

        let mut guard = self.tables.write().await;
        let Some(rows) = guard.get_mut(table) else {
            return Ok(vec![]);
        };

        let targets: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .map(|(i, _)| i)
            .collect();

        let mut updated = Vec::with_capacity(targets.len());
        for index in targets {
            let mut object = ensure_object(&rows[index], "stored row")?.clone();
            for (column, value) in &patch {
                object.insert(column.clone(), value.clone());
            }
            if let Some(constraint) = Self::violates_unique(rows, &object, table, Some(index)) {
                return Err(StoreError::Conflict(constraint));
            }
            rows[index] = Value::Object(object);
            updated.push(rows[index].clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        Self::check_table(table)?;
        filter.validate()?;

        let mut guard = self.tables.write().await;
        let Some(rows) = guard.get_mut(table) else {
            return Ok(vec![]);
        };
        let (removed, kept): (Vec<Row>, Vec<Row>) = rows.drain(..).partition(|row| filter.matches(row));
        *rows = kept;
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
