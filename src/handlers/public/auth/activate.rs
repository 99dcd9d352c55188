use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub email: String,
    pub token: String,
}

/// PUT /auth/activate - Confirm an account with the token issued at sign-up
pub async fn activate(State(state): State<AppState>, Json(body): Json<ActivateRequest>) -> ApiResult<Value> {
    state.accounts.activate(&body.email, &body.token).await?;
    Ok(ApiResponse::success(json!({ "confirmed": true })))
}
