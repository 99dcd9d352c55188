use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::gateway::TenantScope;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AdminService, InstanceSummary};

/// GET /api/admin/instances - Every instance with its member counts
pub async fn list(State(state): State<AppState>, Extension(scope): Extension<TenantScope>) -> ApiResult<Vec<InstanceSummary>> {
    let overview = AdminService::new(state.store.clone()).overview(&scope).await?;
    Ok(ApiResponse::success(overview))
}
