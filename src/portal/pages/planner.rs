use serde_json::json;
use uuid::Uuid;

use super::{decode_all, first, PageContext};
use crate::database::models::{tables, Task, TaskStatus};
use crate::portal::error::ClientError;

/// Tasks of the instance, oldest first.
pub async fn list_tasks(ctx: &PageContext) -> Result<Vec<Task>, ClientError> {
    let filter = ctx.scoped().order_by("created_at", true);
    let rows = ctx.backend().select_many(tables::TASKS, &filter).await?;
    decode_all(rows)
}

pub async fn add_task(ctx: &PageContext, description: &str) -> Result<Task, ClientError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ClientError::validation("Task description cannot be empty"));
    }
    let row = ctx.owned(json!({ "task_description": description }));
    let rows = ctx.backend().insert(tables::TASKS, vec![row]).await?;
    first(rows, "Task")
}

pub async fn change_status(ctx: &PageContext, task_id: Uuid, status: TaskStatus) -> Result<Task, ClientError> {
    let filter = ctx.scoped().eq("id", task_id);
    let rows = ctx
        .backend()
        .update(tables::TASKS, &filter, json!({ "status": status.as_str() }))
        .await?;
    first(rows, "Task")
}

pub async fn delete_task(ctx: &PageContext, task_id: Uuid) -> Result<(), ClientError> {
    let filter = ctx.scoped().eq("id", task_id);
    let removed = ctx.backend().delete(tables::TASKS, &filter).await?;
    if removed.is_empty() {
        return Err(ClientError::NotFound("Task not found".into()));
    }
    Ok(())
}
