use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::gateway::TenantScope;

/// The caller's stored profile row, loaded after token validation
#[derive(Clone, Debug)]
pub struct ValidatedProfile(pub UserProfile);

/// Loads the profile for the token subject and injects [`ValidatedProfile`]
/// and the [`TenantScope`] derived from it. A subject without a profile row
/// gets 404 so clients can tell it apart from a bad token.
pub async fn validate_profile_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before profile validation"))?;

    let profile = state.accounts.profile(auth_user.user_id).await?.ok_or_else(|| {
        tracing::warn!("Profile validation failed: no profile row for subject {}", auth_user.user_id);
        ApiError::not_found("User profile not found")
    })?;

    let scope = TenantScope::from(&profile);
    tracing::debug!(
        "Profile validated: {} ({}) in instance {}",
        profile.id,
        profile.role,
        profile.instance_id
    );

    request.extensions_mut().insert(scope);
    request.extensions_mut().insert(ValidatedProfile(profile));
    Ok(next.run(request).await)
}

/// Elevated tier: the stored profile must carry the SUPER_ADMIN role
pub async fn require_super_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let scope = request
        .extensions()
        .get::<TenantScope>()
        .copied()
        .ok_or_else(|| ApiError::unauthorized("Profile validation required before role check"))?;

    if !scope.is_super_admin() {
        tracing::warn!("User {} denied elevated route as {}", scope.user_id, scope.role);
        return Err(ApiError::forbidden("Super admin role required"));
    }
    Ok(next.run(request).await)
}
