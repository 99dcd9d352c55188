use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenIssuer;
use crate::config::{AppConfig, Environment};
use crate::database::Store;
use crate::gateway::{TenantGateway, TenantScope};
use crate::handlers;
use crate::middleware::{jwt_auth_middleware, require_super_admin_middleware, validate_profile_middleware};
use crate::services::AccountService;

const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Shared request state: the store every tier reads through, plus the
/// services built on top of it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub issuer: TokenIssuer,
    pub accounts: Arc<AccountService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        let issuer = TokenIssuer::from_config(&config);
        let accounts = AccountService::new(
            store.clone(),
            issuer.clone(),
            config.security.require_email_confirmation,
            config.security.min_password_length,
        );
        Self {
            store,
            issuer,
            accounts: Arc::new(accounts),
            config: Arc::new(config),
        }
    }

    /// A gateway bound to the caller's scope.
    pub fn gateway(&self, scope: TenantScope) -> TenantGateway {
        TenantGateway::new(self.store.clone(), scope)
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected: JWT, then stored profile
        .merge(protected_routes(state.clone()))
        // Elevated: protected plus SUPER_ADMIN
        .merge(elevated_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/signin", post(auth::session_signin))
        .route("/auth/signup", post(auth::user_signup))
        .route("/auth/activate", put(auth::user_activate))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{auth, data, find, sales};

    Router::new()
        .route("/api/auth/whoami", get(auth::session_whoami))
        .route("/api/auth/session/refresh", put(auth::session_refresh))
        .route("/api/auth/session", axum::routing::delete(auth::session_logout))
        .route("/api/find/:table", post(find::find_post))
        .route(
            "/api/data/:table",
            post(data::table_post).patch(data::table_patch).delete(data::table_delete),
        )
        .route(
            "/api/sales/import",
            post(sales::sales_import).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route_layer(from_fn_with_state(state.clone(), validate_profile_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    use handlers::elevated::admin;

    Router::new()
        .route("/api/admin/instances", get(admin::instances_list))
        .route_layer(from_fn(require_super_admin_middleware))
        .route_layer(from_fn_with_state(state.clone(), validate_profile_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "AuthorNest API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant author workspace backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/signin, /auth/signup, /auth/activate (public)",
                "auth": "/api/auth/whoami, /api/auth/session[/refresh] (protected)",
                "data": "/api/data/:table (protected)",
                "find": "/api/find/:table (protected)",
                "sales": "/api/sales/import (protected)",
                "admin": "/api/admin/instances (super admin)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
