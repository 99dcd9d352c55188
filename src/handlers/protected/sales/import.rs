use axum::{body::Bytes, extract::State, Extension};

use crate::app::AppState;
use crate::database::models::Role;
use crate::error::ApiError;
use crate::gateway::TenantScope;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{IngestService, IngestSummary};

/// POST /api/sales/import - Upload a KDP sales report (raw CSV body)
///
/// Rows without a readable date are skipped and counted. Accepted rows are
/// stamped with the uploader's instance and user.
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "parsed": 120, "accepted": 118, "skipped": 2, "inserted": 118 } }
/// ```
pub async fn import(
    State(state): State<AppState>,
    Extension(scope): Extension<TenantScope>,
    body: Bytes,
) -> ApiResult<IngestSummary> {
    if scope.role == Role::BetaReader {
        tracing::warn!("Beta reader {} attempted a sales import", scope.user_id);
        return Err(ApiError::forbidden("Sales imports are available to authors only"));
    }
    if body.is_empty() {
        return Err(ApiError::field_error("file", "Upload is empty"));
    }

    let gateway = state.gateway(scope);
    let summary = IngestService::ingest(&gateway, &body, state.config.api.max_upload_rows).await?;
    Ok(ApiResponse::created(summary))
}
