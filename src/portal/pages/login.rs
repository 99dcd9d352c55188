use serde::Serialize;
use tracing::warn;

use super::decode;
use crate::database::models::{tables, UserProfile};
use crate::filter::Filter;
use crate::portal::backend::{Backend, Session};
use crate::portal::error::ClientError;
use crate::portal::route_gate::home_for;
use crate::portal::session::SessionStore;

pub const MISSING_PROFILE_MESSAGE: &str = "Could not find user profile. Please contact support.";

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub session: Session,
    pub profile: UserProfile,
    /// Landing page for the profile's role
    pub redirect_to: &'static str,
}

/// Signs in and picks the landing page from the stored role. A session
/// without a readable profile row is signed out again.
pub async fn login(session: &SessionStore, backend: &dyn Backend, email: &str, password: &str) -> Result<LoginOutcome, ClientError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ClientError::validation("Email and password are required"));
    }

    let signed_in = session.sign_in(email, password).await?;
    let lookup = backend
        .select_one(tables::USERS, &Filter::new().eq("id", signed_in.user_id))
        .await;

    let profile = match lookup {
        Ok(Some(row)) => decode::<UserProfile>(row),
        Ok(None) => Err(ClientError::NotFound(MISSING_PROFILE_MESSAGE.into())),
        Err(ClientError::NotFound(_)) => Err(ClientError::NotFound(MISSING_PROFILE_MESSAGE.into())),
        Err(e) => Err(e),
    };

    match profile {
        Ok(profile) => Ok(LoginOutcome {
            redirect_to: home_for(profile.role),
            session: signed_in,
            profile,
        }),
        Err(e) => {
            warn!("Profile lookup after sign-in failed for {}: {}", signed_in.user_id, e);
            session.sign_out().await;
            Err(e)
        }
    }
}
