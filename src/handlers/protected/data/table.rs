use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::gateway::TenantScope;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub filter: Filter,
    pub patch: Value,
}

/// POST /api/data/:table - Create rows (a JSON array, or a single object)
///
/// Ownership columns are stamped from the caller's profile; values sent by
/// the client for them are ignored.
pub async fn post(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Extension(scope): Extension<TenantScope>,
    Json(payload): Json<Value>,
) -> ApiResult<Vec<Value>> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(_) => vec![payload],
        _ => return Err(ApiError::bad_request("Expected a JSON object or an array of objects")),
    };

    let created = state.gateway(scope).insert(&table, rows).await?;
    Ok(ApiResponse::created(created))
}

/// PATCH /api/data/:table - Update the rows matching `where` with `patch`
///
/// Expected Input:
/// ```json
/// { "where": { "id": "uuid" }, "patch": { "status": "Done" } }
/// ```
pub async fn patch(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Extension(scope): Extension<TenantScope>,
    Json(body): Json<UpdateRequest>,
) -> ApiResult<Vec<Value>> {
    let updated = state.gateway(scope).update(&table, body.filter, body.patch).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/data/:table - Delete the rows matching `where`
pub async fn delete(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Extension(scope): Extension<TenantScope>,
    Json(filter): Json<Filter>,
) -> ApiResult<Vec<Value>> {
    if filter.where_clause.is_empty() {
        return Err(ApiError::bad_request("Refusing to delete without a where clause"));
    }
    let deleted = state.gateway(scope).delete(&table, filter).await?;
    Ok(ApiResponse::success(deleted))
}
