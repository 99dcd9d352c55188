//! Server-side tenant isolation.
//!
//! Every data route goes through [`TenantGateway`]; the scope it applies is
//! derived from the caller's stored profile, never from the request body.

pub mod scope;

use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::database::models::{tables, KdpFormat, Role, TaskStatus, ThemePreference};
use crate::database::{Row, Store, StoreError};
use crate::filter::{as_text, Filter};

pub use scope::TenantScope;

/// Profile columns a user may change about themselves.
pub const PROFILE_SETTINGS_COLUMNS: [&str; 4] = ["full_name", "genre", "bio", "theme_preference"];

/// Columns no data-route update may touch.
const IMMUTABLE_COLUMNS: [&str; 4] = ["id", "instance_id", "user_id", "created_at"];

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct TenantGateway {
    store: Arc<dyn Store>,
    scope: TenantScope,
}

impl TenantGateway {
    pub fn new(store: Arc<dyn Store>, scope: TenantScope) -> Self {
        Self { store, scope }
    }

    pub fn scope(&self) -> &TenantScope {
        &self.scope
    }

    pub fn require_role(&self, role: Role) -> Result<(), GatewayError> {
        if self.scope.role == role {
            Ok(())
        } else {
            warn!("Role check failed: {} required, caller {} is {}", role, self.scope.user_id, self.scope.role);
            Err(GatewayError::Forbidden(format!("{} role required", role)))
        }
    }

    pub async fn select_many(&self, table: &str, filter: Filter) -> Result<Vec<Row>, GatewayError> {
        Self::readable(table)?;
        let filter = self.scoped(filter)?;
        debug!("Scoped select on {} for instance {}", table, self.scope.instance_id);
        Ok(self.store.select_many(table, &filter).await?)
    }

    pub async fn select_one(&self, table: &str, filter: Filter) -> Result<Option<Row>, GatewayError> {
        Self::readable(table)?;
        let filter = self.scoped(filter)?;
        Ok(self.store.select_one(table, &filter).await?)
    }

    pub async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, GatewayError> {
        if !tables::is_tenant_table(table) {
            return Err(self.refuse(format!("Rows cannot be created in '{}'", table)));
        }
        self.check_writer(table)?;

        let mut stamped = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut object) = row else {
                return Err(GatewayError::Validation("Each row must be a JSON object".into()));
            };
            object.remove("id");
            object.remove("created_at");
            validate_new_row(table, &object)?;
            stamped.push(Value::Object(self.scope.stamp(object)));
        }
        if stamped.is_empty() {
            return Ok(vec![]);
        }

        Ok(self.store.insert(table, stamped).await?)
    }

    pub async fn update(&self, table: &str, filter: Filter, patch: Row) -> Result<Vec<Row>, GatewayError> {
        Self::readable(table)?;
        let Value::Object(patch) = patch else {
            return Err(GatewayError::Validation("Patch must be a JSON object".into()));
        };
        if patch.is_empty() {
            return Err(GatewayError::Validation("Patch has no columns".into()));
        }

        let mut filter = self.scoped(filter)?;
        if table == tables::USERS {
            self.check_profile_patch(&filter, &patch)?;
            filter.set("id", Value::String(self.scope.user_id.to_string()));
        } else {
            self.check_writer(table)?;
            if let Some(column) = patch.keys().find(|c| IMMUTABLE_COLUMNS.contains(&c.as_str())) {
                return Err(self.refuse(format!("Column '{}' cannot be changed", column)));
            }
            if let Some(required) = required_column(table) {
                if patch.contains_key(required) && !non_blank(&patch, required) {
                    return Err(GatewayError::Validation(format!("'{}' cannot be blank", required)));
                }
            }
            validate_columns(table, &patch)?;
        }

        Ok(self.store.update(table, &filter, Value::Object(patch)).await?)
    }

    pub async fn delete(&self, table: &str, filter: Filter) -> Result<Vec<Row>, GatewayError> {
        if !tables::is_tenant_table(table) {
            return Err(self.refuse(format!("Rows cannot be deleted from '{}'", table)));
        }
        self.check_writer(table)?;
        let filter = self.scoped(filter)?;
        Ok(self.store.delete(table, &filter).await?)
    }

    fn readable(table: &str) -> Result<(), GatewayError> {
        if table == tables::USERS || tables::is_tenant_table(table) {
            Ok(())
        } else {
            Err(GatewayError::Forbidden(format!("Table '{}' is not accessible", table)))
        }
    }

    /// Beta readers may read their instance but never change author data.
    fn check_writer(&self, table: &str) -> Result<(), GatewayError> {
        if self.scope.role == Role::BetaReader {
            return Err(self.refuse(format!("Beta readers cannot modify '{}'", table)));
        }
        Ok(())
    }

    fn scoped(&self, filter: Filter) -> Result<Filter, GatewayError> {
        if !self.scope.admits(&filter) {
            return Err(self.refuse("Cross-tenant access is not allowed".to_string()));
        }
        Ok(self.scope.restrict(filter))
    }

    fn check_profile_patch(&self, filter: &Filter, patch: &Map<String, Value>) -> Result<(), GatewayError> {
        let own_id = self.scope.user_id.to_string();
        if filter.get("id").and_then(as_text).as_deref() != Some(own_id.as_str()) {
            return Err(self.refuse("Profiles can only be updated by their owner".to_string()));
        }
        if let Some(column) = patch.keys().find(|c| !PROFILE_SETTINGS_COLUMNS.contains(&c.as_str())) {
            return Err(self.refuse(format!("Column '{}' cannot be changed", column)));
        }
        if let Some(theme) = patch.get("theme_preference") {
            let valid = theme.as_str().map(|t| ThemePreference::from_str(t).is_ok()).unwrap_or(false);
            if !valid {
                return Err(GatewayError::Validation("theme_preference must be one of modern, warm, classic".into()));
            }
        }
        Ok(())
    }

    fn refuse(&self, message: String) -> GatewayError {
        warn!("Gateway refused request from user {} (instance {}): {}", self.scope.user_id, self.scope.instance_id, message);
        GatewayError::Forbidden(message)
    }
}

fn non_blank(row: &Map<String, Value>, column: &str) -> bool {
    row.get(column)
        .and_then(Value::as_str)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

fn required_column(table: &str) -> Option<&'static str> {
    match table {
        tables::TASKS => Some("task_description"),
        tables::MANUSCRIPTS => Some("title"),
        tables::SALES_DATA => Some("sale_date"),
        _ => None,
    }
}

fn validate_new_row(table: &str, row: &Map<String, Value>) -> Result<(), GatewayError> {
    let Some(required) = required_column(table) else {
        return Ok(());
    };
    if !non_blank(row, required) {
        return Err(GatewayError::Validation(format!("'{}' is required", required)));
    }
    validate_columns(table, row)
}

fn validate_columns(table: &str, row: &Map<String, Value>) -> Result<(), GatewayError> {
    match table {
        tables::TASKS => {
            if let Some(status) = row.get("status") {
                let valid = status.as_str().map(|s| TaskStatus::from_str(s).is_ok()).unwrap_or(false);
                if !valid {
                    return Err(GatewayError::Validation("status must be one of To-Do, In Progress, Done".into()));
                }
            }
        }
        tables::MANUSCRIPTS => {
            if let Some(format) = row.get("kdp_format") {
                let valid = format.as_str().map(|s| KdpFormat::from_str(s).is_ok()).unwrap_or(false);
                if !valid {
                    return Err(GatewayError::Validation("kdp_format must be one of 5x8, 6x9, 8.5x11".into()));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;
    use uuid::Uuid;

    fn scope(role: Role) -> TenantScope {
        TenantScope {
            instance_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role,
        }
    }

    async fn seed_profile(store: &Arc<dyn Store>, scope: &TenantScope) {
        store
            .insert(
                tables::USERS,
                vec![json!({
                    "id": scope.user_id,
                    "instance_id": scope.instance_id,
                    "role": scope.role,
                    "email": format!("{}@x.com", scope.user_id),
                })],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn inserts_are_stamped_with_the_callers_tenant() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let alice = scope(Role::Author);
        let gateway = TenantGateway::new(store.clone(), alice);

        let rows = gateway
            .insert(
                tables::MANUSCRIPTS,
                vec![json!({ "title": "Book One", "instance_id": Uuid::new_v4(), "user_id": Uuid::new_v4() })],
            )
            .await
            .unwrap();

        assert_eq!(rows[0]["instance_id"], json!(alice.instance_id.to_string()));
        assert_eq!(rows[0]["user_id"], json!(alice.user_id.to_string()));
    }

    #[tokio::test]
    async fn reads_never_cross_tenants() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let alice = TenantGateway::new(store.clone(), scope(Role::Author));
        let bob = scope(Role::Author);
        let bob_gateway = TenantGateway::new(store.clone(), bob);

        alice.insert(tables::TASKS, vec![json!({ "task_description": "Alice task" })]).await.unwrap();
        bob_gateway.insert(tables::TASKS, vec![json!({ "task_description": "Bob task" })]).await.unwrap();

        let seen = alice.select_many(tables::TASKS, Filter::new()).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["task_description"], "Alice task");

        let err = alice
            .select_many(tables::TASKS, Filter::new().eq("instance_id", bob.instance_id))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
    }

    #[tokio::test]
    async fn updates_and_deletes_cannot_reach_other_tenants() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let alice = TenantGateway::new(store.clone(), scope(Role::Author));
        let bob = TenantGateway::new(store.clone(), scope(Role::Author));

        let bobs = bob.insert(tables::TASKS, vec![json!({ "task_description": "Bob task" })]).await.unwrap();
        let id = bobs[0]["id"].clone();

        let updated = alice
            .update(tables::TASKS, Filter::new().eq("id", &id), json!({ "status": "Done" }))
            .await
            .unwrap();
        assert!(updated.is_empty());

        let deleted = alice.delete(tables::TASKS, Filter::new().eq("id", &id)).await.unwrap();
        assert!(deleted.is_empty());

        let still_there = bob.select_many(tables::TASKS, Filter::new()).await.unwrap();
        assert_eq!(still_there[0]["status"], "To-Do");
    }

    #[tokio::test]
    async fn ownership_columns_are_immutable() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let gateway = TenantGateway::new(store, scope(Role::Author));
        let rows = gateway.insert(tables::TASKS, vec![json!({ "task_description": "Plot" })]).await.unwrap();

        let err = gateway
            .update(
                tables::TASKS,
                Filter::new().eq("id", &rows[0]["id"]),
                json!({ "instance_id": Uuid::new_v4() }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
    }

    #[tokio::test]
    async fn profile_updates_limited_to_own_settings() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let me = scope(Role::Author);
        let other = TenantScope { user_id: Uuid::new_v4(), ..me };
        seed_profile(&store, &me).await;
        seed_profile(&store, &other).await;
        let gateway = TenantGateway::new(store.clone(), me);

        let updated = gateway
            .update(tables::USERS, Filter::new().eq("id", me.user_id), json!({ "theme_preference": "warm" }))
            .await
            .unwrap();
        assert_eq!(updated[0]["theme_preference"], "warm");

        let err = gateway
            .update(tables::USERS, Filter::new().eq("id", me.user_id), json!({ "role": "SUPER_ADMIN" }))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));

        let err = gateway
            .update(tables::USERS, Filter::new().eq("id", other.user_id), json!({ "bio": "hijacked" }))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));

        let err = gateway
            .update(tables::USERS, Filter::new().eq("id", me.user_id), json!({ "theme_preference": "neon" }))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_blank_required_fields_and_protected_tables() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let gateway = TenantGateway::new(store, scope(Role::Author));

        let err = gateway.insert(tables::TASKS, vec![json!({ "task_description": "   " })]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));

        let err = gateway.insert(tables::USERS, vec![json!({ "email": "x@y.z" })]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));

        let err = gateway.select_many(tables::ACCOUNTS, Filter::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
    }

    #[tokio::test]
    async fn updates_cannot_blank_required_columns() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let gateway = TenantGateway::new(store, scope(Role::Author));
        let task = gateway.insert(tables::TASKS, vec![json!({ "task_description": "Plot" })]).await.unwrap();
        let book = gateway.insert(tables::MANUSCRIPTS, vec![json!({ "title": "Book One" })]).await.unwrap();
        let sale = gateway
            .insert(tables::SALES_DATA, vec![json!({ "sale_date": "2025-03-01", "units_sold": 3 })])
            .await
            .unwrap();

        for (table, row, patch) in [
            (tables::TASKS, &task, json!({ "task_description": "   " })),
            (tables::MANUSCRIPTS, &book, json!({ "title": null })),
            (tables::SALES_DATA, &sale, json!({ "sale_date": null })),
        ] {
            let err = gateway
                .update(table, Filter::new().eq("id", &row[0]["id"]), patch)
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)), "{} accepted a blank required column", table);
        }

        let updated = gateway
            .update(tables::TASKS, Filter::new().eq("id", &task[0]["id"]), json!({ "task_description": "Plot v2" }))
            .await
            .unwrap();
        assert_eq!(updated[0]["task_description"], "Plot v2");
    }

    #[tokio::test]
    async fn beta_readers_cannot_modify_author_tables() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let author_scope = scope(Role::Author);
        let reader_scope = TenantScope {
            user_id: Uuid::new_v4(),
            role: Role::BetaReader,
            ..author_scope
        };
        seed_profile(&store, &reader_scope).await;
        let author = TenantGateway::new(store.clone(), author_scope);
        let reader = TenantGateway::new(store.clone(), reader_scope);
        let task = author.insert(tables::TASKS, vec![json!({ "task_description": "Plot" })]).await.unwrap();
        let id = task[0]["id"].clone();

        assert_eq!(reader.select_many(tables::TASKS, Filter::new()).await.unwrap().len(), 1);

        let err = reader.insert(tables::TASKS, vec![json!({ "task_description": "Mine" })]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
        let err = reader
            .update(tables::TASKS, Filter::new().eq("id", &id), json!({ "status": "Done" }))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
        let err = reader.delete(tables::TASKS, Filter::new().eq("id", &id)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
        assert_eq!(author.select_many(tables::TASKS, Filter::new()).await.unwrap()[0]["status"], "To-Do");

        let updated = reader
            .update(tables::USERS, Filter::new().eq("id", reader_scope.user_id), json!({ "bio": "Avid reader" }))
            .await
            .unwrap();
        assert_eq!(updated[0]["bio"], "Avid reader");
    }

    #[tokio::test]
    async fn role_checks_use_the_stored_role() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let reader = TenantGateway::new(store.clone(), scope(Role::BetaReader));
        assert!(reader.require_role(Role::SuperAdmin).is_err());
        let admin = TenantGateway::new(store, scope(Role::SuperAdmin));
        assert!(admin.require_role(Role::SuperAdmin).is_ok());
    }
}
