//! The hosted auth and data service, seen from the portal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::error::ClientError;
use crate::filter::Filter;
use crate::services::{IngestSummary, SignUpAttributes, SignUpOutcome};

pub type Row = Value;

/// Opaque credential issued by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    /// Subject identifier; equals the profile row id
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Operations the portal needs from the backend. Table operations take
/// equality filters and return JSON rows.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError>;

    async fn sign_up(&self, email: &str, password: &str, attributes: &SignUpAttributes) -> Result<SignUpOutcome, ClientError>;

    async fn sign_out(&self) -> Result<(), ClientError>;

    /// Exchanges the current token for one with a fresh expiry.
    async fn refresh_session(&self) -> Result<Session, ClientError>;

    /// Installs (or clears) the credential used for subsequent calls.
    fn set_session(&self, session: Option<&Session>);

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Row>, ClientError> {
        let mut filter = filter.clone();
        filter.limit = Some(1);
        Ok(self.select_many(table, &filter).await?.into_iter().next())
    }

    async fn select_many(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ClientError>;

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, ClientError>;

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<Vec<Row>, ClientError>;

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ClientError>;

    /// Uploads a sales report for server-side parsing and insertion.
    async fn import_sales(&self, csv: Vec<u8>) -> Result<IngestSummary, ClientError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`Backend`] over the AuthorNest HTTP API.
pub struct HttpBackend {
    base_url: String,
    http_client: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http_client.request(method, url);
        let token = self.token.read().ok().and_then(|guard| guard.clone());
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let start = std::time::Instant::now();
        let response = builder.send().await?;
        let status = response.status();
        debug!("HTTP {} from {} in {:?}", status, response.url().path(), start.elapsed());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| if body.is_empty() { status.to_string() } else { body });
            return Err(ClientError::from_status(status, message));
        }

        let envelope = response.json::<Envelope<T>>().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let builder = self
            .request(Method::POST, "/auth/signin")
            .json(&json!({ "email": email, "password": password }));
        self.send(builder).await
    }

    async fn sign_up(&self, email: &str, password: &str, attributes: &SignUpAttributes) -> Result<SignUpOutcome, ClientError> {
        let mut body = serde_json::to_value(attributes).map_err(|e| ClientError::validation(e.to_string()))?;
        body["email"] = json!(email);
        body["password"] = json!(password);
        self.send(self.request(Method::POST, "/auth/signup").json(&body)).await
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let _: Value = self.send(self.request(Method::DELETE, "/api/auth/session")).await?;
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session, ClientError> {
        self.send(self.request(Method::PUT, "/api/auth/session/refresh")).await
    }

    fn set_session(&self, session: Option<&Session>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = session.map(|s| s.access_token.clone());
        }
    }

    async fn select_many(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ClientError> {
        let path = format!("/api/find/{}", table);
        self.send(self.request(Method::POST, &path).json(filter)).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, ClientError> {
        let path = format!("/api/data/{}", table);
        self.send(self.request(Method::POST, &path).json(&rows)).await
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Row) -> Result<Vec<Row>, ClientError> {
        let path = format!("/api/data/{}", table);
        let body = json!({ "where": filter.where_clause, "patch": patch });
        self.send(self.request(Method::PATCH, &path).json(&body)).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ClientError> {
        let path = format!("/api/data/{}", table);
        self.send(self.request(Method::DELETE, &path).json(filter)).await
    }

    async fn import_sales(&self, csv: Vec<u8>) -> Result<IngestSummary, ClientError> {
        let builder = self
            .request(Method::POST, "/api/sales/import")
            .header(reqwest::header::CONTENT_TYPE, "text/csv")
            .body(csv);
        self.send(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expiry() {
        let mut session = Session {
            access_token: "t".into(),
            user_id: Uuid::new_v4(),
            email: "a@x.com".into(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        };
        assert!(!session.is_expired());
        session.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(session.is_expired());
    }

    #[test]
    fn base_url_is_normalised() {
        let backend = HttpBackend::new("http://localhost:3000/").unwrap();
        assert_eq!(backend.base_url(), "http://localhost:3000");
    }
}
