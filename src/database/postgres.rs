use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use super::models::tables;
use super::store::{ensure_object, Row, Store, StoreError};
use crate::filter::{as_text, is_valid_identifier, Filter};

const KNOWN_TABLES: [&str; 5] = [
    tables::ACCOUNTS,
    tables::USERS,
    tables::TASKS,
    tables::MANUSCRIPTS,
    tables::SALES_DATA,
];

/// Postgres-backed [`Store`]. Rows travel as `jsonb`: reads project with
/// `to_jsonb`, writes are typed through `jsonb_populate_record` so column
/// types come from the table definition.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    log_queries: bool,
}

/// A statement with its text parameters, in `$n` order.
#[derive(Debug, PartialEq)]
struct Statement {
    sql: String,
    params: Vec<Option<String>>,
}

impl PgStore {
    pub fn new(pool: PgPool, log_queries: bool) -> Self {
        Self { pool, log_queries }
    }

    fn table(name: &str) -> Result<String, StoreError> {
        if !KNOWN_TABLES.contains(&name) {
            return Err(StoreError::UnknownTable(name.to_string()));
        }
        Ok(quote(name))
    }

    fn where_sql(filter: &Filter, params: &mut Vec<Option<String>>) -> String {
        if filter.where_clause.is_empty() {
            return String::new();
        }
        let predicates: Vec<String> = filter
            .where_clause
            .iter()
            .map(|(column, value)| match as_text(value) {
                None => format!("{} IS NULL", quote(column)),
                Some(text) => {
                    params.push(Some(text));
                    format!("{}::text = ${}", quote(column), params.len())
                }
            })
            .collect();
        format!(" WHERE {}", predicates.join(" AND "))
    }

    fn select_statement(table: &str, filter: &Filter) -> Result<Statement, StoreError> {
        filter.validate()?;
        let table = Self::table(table)?;
        let mut params = Vec::new();
        let mut sql = format!("SELECT to_jsonb(t) FROM {} t{}", table, Self::where_sql(filter, &mut params));
        if let Some(order) = &filter.order {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                quote(&order.column),
                if order.ascending { "ASC" } else { "DESC" }
            ));
        }
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Ok(Statement { sql, params })
    }

    fn insert_statement(table: &str, row: &Row) -> Result<Statement, StoreError> {
        let quoted = Self::table(table)?;
        let columns = row_columns(row, "inserted row")?;
        let sql = format!(
            "INSERT INTO {table} ({cols}) SELECT {cols} FROM jsonb_populate_record(NULL::{table}, $1::jsonb) RETURNING to_jsonb({table}.*)",
            table = quoted,
            cols = columns.join(", "),
        );
        Ok(Statement { sql, params: vec![Some(row.to_string())] })
    }

    fn update_statement(table: &str, filter: &Filter, patch: &Row) -> Result<Statement, StoreError> {
        filter.validate()?;
        let quoted = Self::table(table)?;
        let columns = row_columns(patch, "patch")?;
        let mut params = vec![Some(patch.to_string())];
        let assignments: Vec<String> = columns
            .iter()
            .map(|col| format!("{col} = (SELECT {col} FROM jsonb_populate_record(NULL::{quoted}, $1::jsonb))"))
            .collect();
        let sql = format!(
            "UPDATE {quoted} SET {}{} RETURNING to_jsonb({quoted}.*)",
            assignments.join(", "),
            Self::where_sql(filter, &mut params),
        );
        Ok(Statement { sql, params })
    }

    fn delete_statement(table: &str, filter: &Filter) -> Result<Statement, StoreError> {
        filter.validate()?;
        let quoted = Self::table(table)?;
        let mut params = Vec::new();
        let sql = format!(
            "DELETE FROM {quoted}{} RETURNING to_jsonb({quoted}.*)",
            Self::where_sql(filter, &mut params)
        );
        Ok(Statement { sql, params })
    }

    async fn fetch(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        if self.log_queries {
            debug!("SQL: {} ({} params)", statement.sql, statement.params.len());
        }
        let mut query = sqlx::query_scalar::<_, Value>(&statement.sql);
        for param in &statement.params {
            query = query.bind(param.clone());
        }
        query.fetch_all(&self.pool).await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select_many(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        self.fetch(Self::select_statement(table, filter)?).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let statements = rows
            .iter()
            .map(|row| Self::insert_statement(table, row))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(statements.len());
        for statement in statements {
            if self.log_queries {
                debug!("SQL: {}", statement.sql);
            }
            let mut query = sqlx::query_scalar::<_, Value>(&statement.sql);
            for param in &statement.params {
                query = query.bind(param.clone());
            }
            inserted.push(query.fetch_one(&mut *tx).await.map_err(map_sqlx_error)?);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<Vec<Row>, StoreError> {
        self.fetch(Self::update_statement(table, filter, &patch)?).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        self.fetch(Self::delete_statement(table, filter)?).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn row_columns(row: &Row, what: &str) -> Result<Vec<String>, StoreError> {
    let object = ensure_object(row, what)?;
    if object.is_empty() {
        return Err(StoreError::InvalidRow(format!("{} has no columns", what)));
    }
    object
        .keys()
        .map(|column| {
            if is_valid_identifier(column) {
                Ok(quote(column))
            } else {
                Err(StoreError::InvalidRow(format!("invalid column name '{}'", column)))
            }
        })
        .collect()
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(db_err.constraint().unwrap_or("unique").to_string());
        }
    }
    StoreError::Sqlx(err)
}
