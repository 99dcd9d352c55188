use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{random_token, PasswordError};
use crate::auth::{hash_password, verify_password, Claims, JwtError, TokenIssuer};
use crate::database::models::{tables, Account, Role, UserProfile};
use crate::database::{Store, StoreError};
use crate::filter::Filter;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("Invalid or expired confirmation token")]
    InvalidConfirmation,

    #[error("{0}")]
    Validation(String),

    #[error("User already registered: {0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Profile attributes supplied at sign-up. Every new account gets its own
/// instance; there is no way to name an existing one here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpAttributes {
    pub role: Role,
    pub full_name: String,
    #[serde(default)]
    pub genre: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpOutcome {
    pub user_id: Uuid,
    pub instance_id: Uuid,
    pub confirmation_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>,
}

/// What the auth service hands back on sign-in: an opaque bearer token plus
/// the subject and expiry it encodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub access_token: String,
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionGrant {
    fn from_claims(access_token: String, claims: &Claims) -> Self {
        Self {
            access_token,
            user_id: claims.sub,
            email: claims.email.clone(),
            expires_at: claims.expires_at(),
        }
    }
}

/// Account provisioning and credential checks.
pub struct AccountService {
    store: Arc<dyn Store>,
    issuer: TokenIssuer,
    require_confirmation: bool,
    min_password_length: usize,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, issuer: TokenIssuer, require_confirmation: bool, min_password_length: usize) -> Self {
        Self {
            store,
            issuer,
            require_confirmation,
            min_password_length,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Creates the account and its profile row. Super admins cannot be
    /// created through self-service sign-up.
    pub async fn sign_up(&self, email: &str, password: &str, attributes: SignUpAttributes) -> Result<SignUpOutcome, AccountError> {
        if attributes.role == Role::SuperAdmin {
            return Err(AccountError::Forbidden("Super admin accounts cannot be self-registered".into()));
        }
        self.provision(email, password, attributes).await
    }

    /// Creates a super admin unless the email is already registered.
    pub async fn ensure_super_admin(&self, email: &str, password: &str) -> Result<bool, AccountError> {
        if self.find_account(email).await?.is_some() {
            return Ok(false);
        }
        let attributes = SignUpAttributes {
            role: Role::SuperAdmin,
            full_name: "Super Admin".into(),
            genre: None,
        };
        let outcome = self.provision(email, password, attributes).await?;
        if outcome.confirmation_required {
            self.store
                .update(
                    tables::ACCOUNTS,
                    &Filter::new().eq("id", outcome.user_id),
                    json!({ "confirmed": true, "confirmation_digest": null }),
                )
                .await?;
        }
        info!("Provisioned super admin {}", outcome.user_id);
        Ok(true)
    }

    async fn provision(&self, email: &str, password: &str, attributes: SignUpAttributes) -> Result<SignUpOutcome, AccountError> {
        let email = normalize_email(email);
        validate_email_format(&email).map_err(AccountError::Validation)?;
        if password.chars().count() < self.min_password_length {
            return Err(AccountError::Validation(format!(
                "Password should be at least {} characters",
                self.min_password_length
            )));
        }
        let full_name = attributes.full_name.trim();
        if full_name.is_empty() {
            return Err(AccountError::Validation("Full name is required".into()));
        }

        if self.find_account(&email).await?.is_some() {
            return Err(AccountError::Conflict(email));
        }

        let password_hash = hash_password(password)?;
        let confirmation_token = if self.require_confirmation { Some(random_token()?) } else { None };
        let user_id = Uuid::new_v4();
        let instance_id = Uuid::new_v4();

        self.store
            .insert(
                tables::ACCOUNTS,
                vec![json!({
                    "id": user_id,
                    "email": email,
                    "password_hash": password_hash,
                    "confirmed": !self.require_confirmation,
                    "confirmation_digest": confirmation_token.as_deref().map(digest),
                })],
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AccountError::Conflict(email.clone()),
                other => other.into(),
            })?;

        let profile = json!({
            "id": user_id,
            "instance_id": instance_id,
            "full_name": full_name,
            "role": attributes.role,
            "email": email,
            "genre": attributes.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()),
            "theme_preference": "modern",
        });
        if let Err(e) = self.store.insert(tables::USERS, vec![profile]).await {
            warn!("Profile provisioning failed for {}, removing account: {}", user_id, e);
            self.store.delete(tables::ACCOUNTS, &Filter::new().eq("id", user_id)).await?;
            return Err(e.into());
        }

        info!("Provisioned {} account {} in instance {}", attributes.role, user_id, instance_id);
        Ok(SignUpOutcome {
            user_id,
            instance_id,
            confirmation_required: self.require_confirmation,
            confirmation_token,
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionGrant, AccountError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AccountError::Validation("Email and password are required".into()));
        }

        let Some(account) = self.find_account(&email).await? else {
            warn!("Sign-in failed: unknown email");
            return Err(AccountError::InvalidCredentials);
        };
        if !verify_password(&account.password_hash, password) {
            warn!("Sign-in failed: wrong password for account {}", account.id);
            return Err(AccountError::InvalidCredentials);
        }
        if self.require_confirmation && !account.confirmed {
            return Err(AccountError::EmailNotConfirmed);
        }

        let (token, claims) = self.issuer.issue(account.id, &account.email)?;
        info!("Account {} signed in", account.id);
        Ok(SessionGrant::from_claims(token, &claims))
    }

    pub async fn activate(&self, email: &str, token: &str) -> Result<(), AccountError> {
        let email = normalize_email(email);
        let account = self.find_account(&email).await?.ok_or(AccountError::InvalidConfirmation)?;
        if account.confirmed {
            return Ok(());
        }
        if account.confirmation_digest.as_deref() != Some(digest(token.trim()).as_str()) {
            return Err(AccountError::InvalidConfirmation);
        }
        self.store
            .update(
                tables::ACCOUNTS,
                &Filter::new().eq("id", account.id),
                json!({ "confirmed": true, "confirmation_digest": null }),
            )
            .await?;
        info!("Account {} confirmed", account.id);
        Ok(())
    }

    /// Re-issues a token for a session whose account still exists.
    pub async fn refresh(&self, claims: &Claims) -> Result<SessionGrant, AccountError> {
        let account = self
            .store
            .select_one(tables::ACCOUNTS, &Filter::new().eq("id", claims.sub))
            .await?
            .ok_or(AccountError::InvalidCredentials)?;
        let account: Account = decode_row(account)?;
        let (token, claims) = self.issuer.issue(account.id, &account.email)?;
        Ok(SessionGrant::from_claims(token, &claims))
    }

    /// The profile row for a subject, if it has been provisioned.
    pub async fn profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AccountError> {
        let row = self.store.select_one(tables::USERS, &Filter::new().eq("id", user_id)).await?;
        Ok(row.map(decode_row).transpose()?)
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let row = self.store.select_one(tables::ACCOUNTS, &Filter::new().eq("email", email)).await?;
        Ok(row.map(decode_row).transpose()?)
    }
}

pub(crate) fn decode_row<T: serde::de::DeserializeOwned>(row: serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::InvalidRow(e.to_string()))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err("Invalid email format".to_string());
    }
    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}
