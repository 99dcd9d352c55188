use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_collection, output_success};
use crate::cli::CliContext;
use crate::database::models::KdpFormat;
use crate::portal::pages::library;

#[derive(Subcommand)]
pub enum ManuscriptCommands {
    #[command(about = "List manuscripts, newest first")]
    List,

    #[command(about = "Create a manuscript")]
    Create {
        #[arg(help = "Title")]
        title: String,
        #[arg(long, default_value = "6x9", help = "Trim size: 5x8, 6x9 or 8.5x11")]
        format: KdpFormat,
    },
}

pub async fn handle(cmd: ManuscriptCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let page = ctx.page()?;
    match cmd {
        ManuscriptCommands::List => {
            let manuscripts = library::list_manuscripts(&page).await?;
            output_collection(
                &ctx.output,
                "manuscripts",
                &manuscripts,
                "No manuscripts yet. Create one to get started!",
                |m| {
                    format!(
                        "{}  {}  (format {}, status {})",
                        m.id,
                        m.title,
                        m.kdp_format.as_str(),
                        m.status.as_deref().unwrap_or("-")
                    )
                },
            )
        }
        ManuscriptCommands::Create { title, format } => {
            let manuscript = library::create_manuscript(&page, &title, format).await?;
            output_success(
                &ctx.output,
                &format!("Created manuscript '{}'", manuscript.title),
                Some(json!({ "manuscript": manuscript })),
            )
        }
    }
}
