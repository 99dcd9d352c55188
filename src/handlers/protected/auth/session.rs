use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedProfile};
use crate::services::SessionGrant;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub profile: UserProfile,
}

/// GET /api/auth/whoami - Current subject and its stored profile
pub async fn whoami(
    Extension(auth_user): Extension<AuthUser>,
    Extension(ValidatedProfile(profile)): Extension<ValidatedProfile>,
) -> ApiResult<WhoAmI> {
    Ok(ApiResponse::success(WhoAmI {
        user_id: auth_user.user_id,
        email: auth_user.email,
        expires_at: auth_user.claims.expires_at(),
        profile,
    }))
}

/// PUT /api/auth/session/refresh - Re-issue the current session token with a
/// fresh expiry
pub async fn refresh(State(state): State<AppState>, Extension(auth_user): Extension<AuthUser>) -> ApiResult<SessionGrant> {
    let grant = state.accounts.refresh(&auth_user.claims).await?;
    tracing::debug!("Session refreshed for {}", auth_user.user_id);
    Ok(ApiResponse::success(grant))
}

/// DELETE /api/auth/session - Sign out
///
/// Tokens are stateless, so this only records the event; the client drops
/// its copy of the token.
pub async fn logout(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Value> {
    tracing::info!("User {} signed out", auth_user.user_id);
    Ok(ApiResponse::success(json!({ "signed_out": true })))
}
