use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_collection, output_success};
use crate::cli::CliContext;
use crate::database::models::TaskStatus;
use crate::portal::pages::planner;

#[derive(Subcommand)]
pub enum TaskCommands {
    #[command(about = "List tasks, oldest first")]
    List,

    #[command(about = "Add a task")]
    Add {
        #[arg(help = "Task description")]
        description: String,
    },

    #[command(about = "Change a task's status")]
    Status {
        #[arg(help = "Task ID")]
        id: Uuid,
        #[arg(help = "To-Do, In Progress or Done")]
        status: TaskStatus,
    },

    #[command(about = "Delete a task")]
    Delete {
        #[arg(help = "Task ID")]
        id: Uuid,
    },
}

pub async fn handle(cmd: TaskCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let page = ctx.page()?;
    match cmd {
        TaskCommands::List => {
            let tasks = planner::list_tasks(&page).await?;
            output_collection(
                &ctx.output,
                "tasks",
                &tasks,
                "Your task list is empty. Add a task to get started!",
                |task| format!("{}  [{}]  {}", task.id, task.status.as_str(), task.task_description),
            )
        }
        TaskCommands::Add { description } => {
            let task = planner::add_task(&page, &description).await?;
            output_success(&ctx.output, &format!("Added task {}", task.id), Some(json!({ "task": task })))
        }
        TaskCommands::Status { id, status } => {
            let task = planner::change_status(&page, id, status).await?;
            output_success(
                &ctx.output,
                &format!("Task {} is now {}", task.id, task.status.as_str()),
                Some(json!({ "task": task })),
            )
        }
        TaskCommands::Delete { id } => {
            planner::delete_task(&page, id).await?;
            output_success(&ctx.output, &format!("Deleted task {}", id), None)
        }
    }
}
