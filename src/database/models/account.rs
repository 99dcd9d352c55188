use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credential record behind a profile. Never exposed through data routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub confirmed: bool,
    /// SHA-256 hex digest of the pending confirmation token
    #[serde(default)]
    pub confirmation_digest: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
