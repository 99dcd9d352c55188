//! Test utilities: a scripted in-memory [`Backend`] for portal tests.
//!
//! Table operations apply the given filter as-is, with no tenant scoping,
//! so tests observe exactly what the portal asked for.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::database::models::{tables, Role, ThemePreference, UserProfile};
use crate::database::MemoryStore;
use crate::filter::{compare_values, Filter};
use crate::gateway::TenantScope;
use crate::portal::backend::{Backend, Row, Session};
use crate::portal::error::ClientError;
use crate::services::{IngestService, IngestSummary, SignUpAttributes, SignUpOutcome};

struct Credentials {
    user_id: Uuid,
    password: String,
}

#[derive(Default)]
struct GateInner {
    blocked: Notify,
    released: Notify,
}

/// Holds back the next profile lookup until released. Only one lookup is
/// held per call to [`FakeBackend::hold_profile_lookups`]; the row is read
/// after release, so changes made meanwhile are visible to it.
pub struct LookupGate {
    inner: Arc<GateInner>,
}

impl LookupGate {
    pub async fn wait_until_blocked(&self) {
        self.inner.blocked.notified().await;
    }

    pub fn release(&self) {
        self.inner.released.notify_one();
    }
}

#[derive(Default)]
pub struct FakeBackend {
    accounts: Mutex<HashMap<String, Credentials>>,
    tables: Mutex<HashMap<String, Vec<Row>>>,
    session: Mutex<Option<Session>>,
    offline: AtomicBool,
    profile_lookups: AtomicUsize,
    gate: Mutex<Option<Arc<GateInner>>>,
    clock: AtomicI64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers credentials and returns the subject id.
    pub fn add_account(&self, email: &str, password: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        lock(&self.accounts).insert(
            email.to_lowercase(),
            Credentials {
                user_id,
                password: password.to_string(),
            },
        );
        user_id
    }

    pub fn add_profile(&self, user_id: Uuid, instance_id: Uuid, role: Role, full_name: &str) -> UserProfile {
        let email = lock(&self.accounts)
            .iter()
            .find(|(_, c)| c.user_id == user_id)
            .map(|(email, _)| email.clone())
            .unwrap_or_else(|| format!("{}@example.com", user_id));
        let row = json!({
            "id": user_id,
            "instance_id": instance_id,
            "full_name": full_name,
            "role": role,
            "email": email,
        });
        let stored = self.store_rows(tables::USERS, vec![row]);
        serde_json::from_value(stored[0].clone()).expect("profile row")
    }

    pub fn set_theme(&self, user_id: Uuid, theme: ThemePreference) {
        let filter = Filter::new().eq("id", user_id);
        self.patch_rows(tables::USERS, &filter, &json!({ "theme_preference": theme }));
    }

    /// While set, every backend call fails with a network error.
    pub fn fail_network(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn session_for(&self, user_id: Uuid, email: &str) -> Session {
        Session {
            access_token: format!("fake-{}", Uuid::new_v4()),
            user_id,
            email: email.to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    /// Number of `users` reads seen so far.
    pub fn profile_lookups(&self) -> usize {
        self.profile_lookups.load(Ordering::SeqCst)
    }

    pub fn hold_profile_lookups(&self) -> LookupGate {
        let inner = Arc::new(GateInner::default());
        *lock(&self.gate) = Some(inner.clone());
        LookupGate { inner }
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    fn online(&self) -> Result<(), ClientError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ClientError::Network("connection refused".into()))
        } else {
            Ok(())
        }
    }

    /// Strictly increasing timestamps so ordering by `created_at` is stable.
    fn next_timestamp(&self) -> String {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
        (base + Duration::seconds(tick)).to_rfc3339()
    }

    fn store_rows(&self, table: &str, rows: Vec<Row>) -> Vec<Row> {
        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            if let Value::Object(object) = &mut row {
                object.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
                object.insert("created_at".into(), json!(self.next_timestamp()));
                for (column, value) in MemoryStore::column_defaults(table) {
                    let slot = object.entry(column).or_insert(Value::Null);
                    if slot.is_null() {
                        *slot = value;
                    }
                }
            }
            stored.push(row);
        }
        lock(&self.tables)
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        stored
    }

    fn patch_rows(&self, table: &str, filter: &Filter, patch: &Value) -> Vec<Row> {
        let mut tables = lock(&self.tables);
        let Some(rows) = tables.get_mut(table) else {
            return vec![];
        };
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| filter.matches(row)) {
            if let (Value::Object(object), Value::Object(patch)) = (&mut *row, patch) {
                for (column, value) in patch {
                    object.insert(column.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        updated
    }

    fn signed_in_scope(&self) -> Result<TenantScope, ClientError> {
        let session = lock(&self.session)
            .clone()
            .ok_or_else(|| ClientError::Auth("Missing bearer token".into()))?;
        let filter = Filter::new().eq("id", session.user_id);
        let row = self
            .rows(tables::USERS)
            .into_iter()
            .find(|row| filter.matches(row))
            .ok_or_else(|| ClientError::NotFound("User profile not found".into()))?;
        let profile: UserProfile =
            serde_json::from_value(row).map_err(|e| ClientError::validation(e.to_string()))?;
        Ok(TenantScope::from(&profile))
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.online()?;
        let user_id = lock(&self.accounts)
            .get(&email.to_lowercase())
            .filter(|c| c.password == password)
            .map(|c| c.user_id)
            .ok_or_else(|| ClientError::Auth("Invalid login credentials".into()))?;
        Ok(self.session_for(user_id, email))
    }

    async fn sign_up(&self, email: &str, password: &str, attributes: &SignUpAttributes) -> Result<SignUpOutcome, ClientError> {
        self.online()?;
        if lock(&self.accounts).contains_key(&email.to_lowercase()) {
            return Err(ClientError::validation(format!("User already registered: {}", email)));
        }
        let user_id = self.add_account(email, password);
        let instance_id = Uuid::new_v4();
        let profile = self.add_profile(user_id, instance_id, attributes.role, &attributes.full_name);
        if let Some(genre) = &attributes.genre {
            self.patch_rows(tables::USERS, &Filter::new().eq("id", profile.id), &json!({ "genre": genre }));
        }
        Ok(SignUpOutcome {
            user_id,
            instance_id,
            confirmation_required: false,
            confirmation_token: None,
        })
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        self.online()
    }

    async fn refresh_session(&self) -> Result<Session, ClientError> {
        self.online()?;
        let current = lock(&self.session)
            .clone()
            .ok_or_else(|| ClientError::Auth("Missing bearer token".into()))?;
        Ok(self.session_for(current.user_id, &current.email))
    }

    fn set_session(&self, session: Option<&Session>) {
        *lock(&self.session) = session.cloned();
    }

    async fn select_many(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ClientError> {
        self.online()?;
        if table == tables::USERS {
            self.profile_lookups.fetch_add(1, Ordering::SeqCst);
            let gate = lock(&self.gate).take();
            if let Some(gate) = gate {
                gate.blocked.notify_one();
                gate.released.notified().await;
            }
        }

        let mut rows: Vec<Row> = self
            .rows(table)
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect();
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

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, ClientError> {
        self.online()?;
        Ok(self.store_rows(table, rows))
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<Vec<Row>, ClientError> {
        self.online()?;
        Ok(self.patch_rows(table, filter, &patch))
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ClientError> {
        self.online()?;
        let mut tables = lock(&self.tables);
        let Some(rows) = tables.get_mut(table) else {
            return Ok(vec![]);
        };
        let (removed, kept): (Vec<Row>, Vec<Row>) = rows.drain(..).partition(|row| filter.matches(row));
        *rows = kept;
        Ok(removed)
    }

    /// Parses like the server does and stamps rows with the signed-in
    /// profile's tenant.
    async fn import_sales(&self, csv: Vec<u8>) -> Result<IngestSummary, ClientError> {
        self.online()?;
        let scope = self.signed_in_scope()?;
        let report = IngestService::parse(&csv).map_err(|e| ClientError::validation(e.to_string()))?;
        let rows: Vec<Row> = report
            .rows
            .iter()
            .filter_map(|sale| match sale.to_row() {
                Value::Object(object) => Some(Value::Object(scope.stamp(object))),
                _ => None,
            })
            .collect();
        let inserted = self.store_rows(tables::SALES_DATA, rows).len();
        Ok(IngestSummary {
            parsed: report.parsed,
            accepted: report.rows.len(),
            skipped: report.skipped,
            inserted,
        })
    }
}
