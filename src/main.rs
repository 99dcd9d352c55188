use std::sync::Arc;

use anyhow::Context;
use authornest::app::{app, AppState};
use authornest::config;
use authornest::database::{DatabaseManager, MemoryStore, PgStore, Store};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("authornest=info,tower_http=info")),
        )
        .init();

    let config = config::config().clone();
    tracing::info!("Starting AuthorNest API in {:?} mode", config.environment);
    if config.signing_secret().is_none() {
        tracing::warn!("JWT_SECRET is not usable in {:?}; sign-in will be unavailable", config.environment);
    }

    let store: Arc<dyn Store> = match DatabaseManager::database_url() {
        Some(url) => {
            let pool = DatabaseManager::connect(&url, &config.database)
                .await
                .context("failed to connect to DATABASE_URL")?;
            DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
            Arc::new(PgStore::new(pool, config.database.enable_query_logging))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let port = config.api.port;
    let state = AppState::new(store, config);
    bootstrap_super_admin(&state).await?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("AuthorNest API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}

/// Super admins cannot self-register; one can be provisioned from the
/// environment at startup.
async fn bootstrap_super_admin(state: &AppState) -> anyhow::Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("AUTHORNEST_ADMIN_EMAIL"),
        std::env::var("AUTHORNEST_ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };
    let created = state
        .accounts
        .ensure_super_admin(&email, &password)
        .await
        .context("failed to provision super admin")?;
    if !created {
        tracing::debug!("Super admin {} already provisioned", email);
    }
    Ok(())
}
