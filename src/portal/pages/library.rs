use serde_json::json;

use super::{decode_all, first, PageContext};
use crate::database::models::{tables, KdpFormat, Manuscript};
use crate::portal::error::ClientError;

/// Manuscripts of the instance, newest first.
pub async fn list_manuscripts(ctx: &PageContext) -> Result<Vec<Manuscript>, ClientError> {
    let filter = ctx.scoped().order_by("created_at", false);
    let rows = ctx.backend().select_many(tables::MANUSCRIPTS, &filter).await?;
    decode_all(rows)
}

pub async fn create_manuscript(ctx: &PageContext, title: &str, format: KdpFormat) -> Result<Manuscript, ClientError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ClientError::validation("Title is required"));
    }
    let row = ctx.owned(json!({ "title": title, "kdp_format": format.as_str() }));
    let rows = ctx.backend().insert(tables::MANUSCRIPTS, vec![row]).await?;
    first(rows, "Manuscript")
}
