pub mod password;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use password::{hash_password, verify_password};

/// Session token claims. `sub` is the account id, which is also the id of
/// the profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: Uuid, email: impl Into<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            email: email.into(),
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

/// Signs and verifies session tokens with a shared HS256 secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Option<String>,
    expiry_hours: u64,
}

impl TokenIssuer {
    pub fn new(secret: Option<&str>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.map(str::to_string),
            expiry_hours,
        }
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(config.signing_secret(), config.security.jwt_expiry_hours)
    }

    pub fn issue(&self, sub: Uuid, email: &str) -> Result<(String, Claims), JwtError> {
        let claims = Claims::new(sub, email, self.expiry_hours);
        let token = generate_jwt(&claims, self.secret()?)?;
        Ok((token, claims))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode_jwt(token, self.secret()?)
    }

    fn secret(&self) -> Result<&str, JwtError> {
        self.secret.as_deref().ok_or(JwtError::InvalidSecret)
    }
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}
