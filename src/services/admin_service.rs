use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{tables, Role, UserProfile};
use crate::database::Store;
use crate::filter::Filter;
use crate::gateway::{GatewayError, TenantScope};
use crate::services::account_service::decode_row;

/// Member counts for one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub instance_id: Uuid,
    pub members: usize,
    pub authors: usize,
    pub readers: usize,
}

/// Cross-instance reporting, available to super admins only. Reads the
/// store directly since it deliberately spans tenants.
pub struct AdminService {
    store: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn overview(&self, caller: &TenantScope) -> Result<Vec<InstanceSummary>, GatewayError> {
        if !caller.is_super_admin() {
            tracing::warn!("User {} requested the instance overview without super admin role", caller.user_id);
            return Err(GatewayError::Forbidden(format!("{} role required", Role::SuperAdmin)));
        }

        let rows = self
            .store
            .select_many(tables::USERS, &Filter::new().order_by("instance_id", true))
            .await?;

        let mut summaries: BTreeMap<Uuid, InstanceSummary> = BTreeMap::new();
        for row in rows {
            let profile: UserProfile = decode_row(row).map_err(GatewayError::from)?;
            let entry = summaries.entry(profile.instance_id).or_insert_with(|| InstanceSummary {
                instance_id: profile.instance_id,
                members: 0,
                authors: 0,
                readers: 0,
            });
            entry.members += 1;
            match profile.role {
                Role::Author => entry.authors += 1,
                Role::BetaReader => entry.readers += 1,
                Role::SuperAdmin => {}
            }
        }
        Ok(summaries.into_values().collect())
    }
}
