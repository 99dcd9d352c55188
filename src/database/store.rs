use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::filter::{Filter, FilterError};

/// A stored row: a JSON object keyed by column name.
pub type Row = Value;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Generic table access used by every backend feature.
///
/// Implementations must treat every predicate of a [`Filter`] as an equality
/// constraint and honour `order` and `limit` on reads.
#[async_trait]
pub trait Store: Send + Sync {
    async fn select_many(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>, StoreError> {
        let mut filter = filter.clone();
        filter.limit = Some(1);
        Ok(self.select_many(table, &filter).await?.into_iter().next())
    }

    /// Inserts rows and returns them as stored (with generated columns).
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    /// Applies `patch` to every matching row and returns the updated rows.
    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<Vec<Row>, StoreError>;

    /// Removes matching rows and returns them.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    /// Connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

pub(crate) fn ensure_object<'a>(row: &'a Row, what: &str) -> Result<&'a serde_json::Map<String, Value>, StoreError> {
    row.as_object()
        .ok_or_else(|| StoreError::InvalidRow(format!("{} must be a JSON object", what)))
}
