use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::config::Environment;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{SignUpAttributes, SignUpOutcome};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub attributes: SignUpAttributes,
}

/// POST /auth/signup - Register an author or beta reader
///
/// Expected Input:
/// ```json
/// {
///   "email": "reader@example.com",
///   "password": "at least six characters",
///   "role": "BETA_READER",
///   "full_name": "Jane Reader",
///   "genre": "Fantasy, Sci-Fi"
/// }
/// ```
///
/// Responds 201 with the new subject and its freshly created instance. The confirmation token is
/// only echoed back in development; elsewhere it has to reach the user out
/// of band.
pub async fn signup(State(state): State<AppState>, Json(body): Json<SignUpRequest>) -> ApiResult<SignUpOutcome> {
    let mut outcome = state.accounts.sign_up(&body.email, &body.password, body.attributes).await?;
    if state.config.environment != Environment::Development {
        outcome.confirmation_token = None;
    }
    Ok(ApiResponse::created(outcome))
}
