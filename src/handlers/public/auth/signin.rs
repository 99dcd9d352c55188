use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::SessionGrant;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/signin - Exchange email and password for a session token
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "access_token": "eyJhbGciOiJIUzI1NiI...",
///     "user_id": "uuid",
///     "email": "author@example.com",
///     "expires_at": "2025-01-08T00:00:00Z"
///   }
/// }
/// ```
///
/// Wrong credentials and unconfirmed accounts both answer 401 with distinct
/// messages.
pub async fn signin(State(state): State<AppState>, Json(body): Json<SignInRequest>) -> ApiResult<SessionGrant> {
    let grant = state.accounts.sign_in(&body.email, &body.password).await?;
    Ok(ApiResponse::success(grant))
}
