use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::filter::Filter;
use crate::gateway::TenantScope;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /api/find/:table - Filtered select within the caller's instance
///
/// Expected Input:
/// ```json
/// { "where": { "status": "To-Do" }, "order": { "column": "created_at", "ascending": true }, "limit": 50 }
/// ```
pub async fn find_post(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Extension(scope): Extension<TenantScope>,
    Json(filter): Json<Filter>,
) -> ApiResult<Vec<Value>> {
    let rows = state.gateway(scope).select_many(&table, filter).await?;
    Ok(ApiResponse::success(rows))
}
