use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::models::{Role, UserProfile};
use crate::filter::{as_text, Filter};

/// Columns that identify ownership and may only be written by the scope.
pub const OWNERSHIP_COLUMNS: [&str; 2] = ["instance_id", "user_id"];

/// The partition a caller may touch, taken from their profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    pub instance_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

impl From<&UserProfile> for TenantScope {
    fn from(profile: &UserProfile) -> Self {
        Self {
            instance_id: profile.instance_id,
            user_id: profile.id,
            role: profile.role,
        }
    }
}

impl TenantScope {
    /// A filter restricted to this tenant.
    pub fn filter(&self) -> Filter {
        Filter::new().eq("instance_id", self.instance_id)
    }

    /// True when the filter does not name a foreign `instance_id`.
    pub fn admits(&self, filter: &Filter) -> bool {
        match filter.get("instance_id") {
            None => true,
            Some(value) => as_text(value) == Some(self.instance_id.to_string()),
        }
    }

    /// Pins `instance_id` on an arbitrary filter.
    pub fn restrict(&self, mut filter: Filter) -> Filter {
        filter.set("instance_id", Value::String(self.instance_id.to_string()));
        filter
    }

    /// Stamps ownership onto a new row, overriding whatever the row carried.
    pub fn stamp(&self, row: Map<String, Value>) -> Map<String, Value> {
        let mut row = row;
        row.insert("instance_id".into(), Value::String(self.instance_id.to_string()));
        row.insert("user_id".into(), Value::String(self.user_id.to_string()));
        row
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> TenantScope {
        TenantScope {
            instance_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: Role::Author,
        }
    }

    #[test]
    fn stamp_overrides_supplied_ownership() {
        let scope = scope();
        let row = json!({ "title": "Draft", "instance_id": "someone-else", "user_id": "spoofed" });
        let stamped = scope.stamp(row.as_object().unwrap().clone());
        assert_eq!(stamped["instance_id"], json!(scope.instance_id.to_string()));
        assert_eq!(stamped["user_id"], json!(scope.user_id.to_string()));
        assert_eq!(stamped["title"], "Draft");
    }

    #[test]
    fn admits_only_own_instance() {
        let scope = scope();
        assert!(scope.admits(&Filter::new().eq("status", "Done")));
        assert!(scope.admits(&scope.filter()));
        assert!(!scope.admits(&Filter::new().eq("instance_id", Uuid::new_v4())));
    }
}
