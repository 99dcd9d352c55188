mod common;

use anyhow::{Context, Result};
use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn instance_overview_requires_super_admin() -> Result<()> {
    let app = TestApp::new();
    let author = app.author("author@example.com").await?;

    let (status, _) = app
        .request(Method::GET, "/api/admin/instances", Some(&author.token), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn super_admin_sees_every_instance() -> Result<()> {
    let app = TestApp::new();
    let author = app.author("author@example.com").await?;
    let reader = app.user("reader@example.com", "BETA_READER", None).await?;
    app.author("other@example.com").await?;

    assert!(app.state.accounts.ensure_super_admin("root@example.com", "root-password").await?);
    let (status, body) = app.sign_in("root@example.com", "root-password").await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["access_token"].as_str().context("missing token")?.to_string();

    let (status, body) = app
        .request(Method::GET, "/api/admin/instances", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let instances = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(instances.len(), 4);

    let find = |instance_id: uuid::Uuid| {
        instances
            .iter()
            .find(|i| i["instance_id"] == json!(instance_id))
            .cloned()
            .context("instance missing")
    };
    let authors = find(author.instance_id)?;
    assert_eq!((authors["members"].as_u64(), authors["authors"].as_u64()), (Some(1), Some(1)));
    let readers = find(reader.instance_id)?;
    assert_eq!((readers["members"].as_u64(), readers["readers"].as_u64()), (Some(1), Some(1)));
    Ok(())
}
