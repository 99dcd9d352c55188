#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use authornest::app::{app, AppState};
use authornest::config::AppConfig;
use authornest::database::MemoryStore;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "secret-pass";

/// The API router over a fresh in-memory store, driven in-process.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

/// A registered and signed-in user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub token: String,
    pub user_id: Uuid,
    pub instance_id: Uuid,
    pub email: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        Self {
            router: app(state.clone()),
            state,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn upload_csv(&self, token: &str, csv: &str) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/sales/import")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(csv.to_string()))?;
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };
        Ok((status, body))
    }

    pub async fn sign_up(&self, email: &str, role: &str, instance_id: Option<Uuid>) -> Result<(StatusCode, Value)> {
        let mut body = json!({
            "email": email,
            "password": PASSWORD,
            "role": role,
            "full_name": format!("{} user", role.to_lowercase()),
        });
        if let Some(instance_id) = instance_id {
            body["instance_id"] = json!(instance_id);
        }
        self.request(Method::POST, "/auth/signup", None, Some(body)).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        self.request(
            Method::POST,
            "/auth/signin",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Signs up with `role` and signs in.
    pub async fn user(&self, email: &str, role: &str, instance_id: Option<Uuid>) -> Result<TestUser> {
        let (status, body) = self.sign_up(email, role, instance_id).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "sign-up failed: {} {}", status, body);
        let instance_id: Uuid = serde_json::from_value(body["data"]["instance_id"].clone())?;

        let (status, body) = self.sign_in(email, PASSWORD).await?;
        anyhow::ensure!(status == StatusCode::OK, "sign-in failed: {} {}", status, body);
        Ok(TestUser {
            token: body["data"]["access_token"].as_str().context("missing access_token")?.to_string(),
            user_id: serde_json::from_value(body["data"]["user_id"].clone())?,
            instance_id,
            email: email.to_string(),
        })
    }

    pub async fn author(&self, email: &str) -> Result<TestUser> {
        self.user(email, "AUTHOR", None).await
    }
}
