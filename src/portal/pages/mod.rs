//! Feature pages of the portal. Each page works on behalf of the resolved
//! profile: reads filter on its `instance_id` and creates carry its
//! `instance_id`/`user_id`, even though the backend pins both again.

pub mod dashboard;
pub mod insights;
pub mod library;
pub mod login;
pub mod planner;
pub mod settings;
pub mod signup;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::backend::{Backend, Row};
use super::error::ClientError;
use super::profile::ProfileResolver;
use crate::database::models::UserProfile;
use crate::filter::Filter;

/// What a protected page needs: the backend and the signed-in profile.
#[derive(Clone)]
pub struct PageContext {
    backend: Arc<dyn Backend>,
    profile: UserProfile,
}

impl PageContext {
    pub fn new(backend: Arc<dyn Backend>, profile: UserProfile) -> Self {
        Self { backend, profile }
    }

    /// Fails with `Auth` while no profile is resolved.
    pub fn from_resolver(backend: Arc<dyn Backend>, resolver: &ProfileResolver) -> Result<Self, ClientError> {
        let profile = resolver
            .profile()
            .ok_or_else(|| ClientError::Auth("Not signed in".into()))?;
        Ok(Self::new(backend, profile))
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub(crate) fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Filter pinned to the profile's instance.
    pub(crate) fn scoped(&self) -> Filter {
        Filter::new().eq("instance_id", self.profile.instance_id)
    }

    /// Stamps ownership onto a row about to be created.
    pub(crate) fn owned(&self, mut row: Value) -> Value {
        if let Value::Object(object) = &mut row {
            object.insert("instance_id".into(), Value::String(self.profile.instance_id.to_string()));
            object.insert("user_id".into(), Value::String(self.profile.id.to_string()));
        }
        row
    }
}

pub(crate) fn decode<T: DeserializeOwned>(row: Row) -> Result<T, ClientError> {
    serde_json::from_value(row).map_err(|e| ClientError::Backend {
        status: 200,
        message: format!("Malformed row: {}", e),
    })
}

pub(crate) fn decode_all<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, ClientError> {
    rows.into_iter().map(decode).collect()
}

/// The single row a create or update returned.
pub(crate) fn first<T: DeserializeOwned>(rows: Vec<Row>, what: &str) -> Result<T, ClientError> {
    match rows.into_iter().next() {
        Some(row) => decode(row),
        None => Err(ClientError::NotFound(format!("{} not found", what))),
    }
}
