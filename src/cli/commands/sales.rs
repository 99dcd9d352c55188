use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::utils::{output_collection, output_success};
use crate::cli::{CliContext, OutputFormat};
use crate::portal::pages::insights::{self, SalesTotals};

#[derive(Subcommand)]
pub enum SalesCommands {
    #[command(about = "List imported sales, most recent first")]
    List,

    #[command(about = "Upload a KDP sales report (CSV)")]
    Import {
        #[arg(help = "Path to the CSV report")]
        file: PathBuf,
    },
}

pub async fn handle(cmd: SalesCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let page = ctx.page()?;
    match cmd {
        SalesCommands::List => {
            let sales = insights::list_sales(&page).await?;
            output_collection(
                &ctx.output,
                "sales",
                &sales,
                "No sales data yet. Upload a KDP report to get started.",
                |s| {
                    format!(
                        "{}  {}  {}  units {}  royalty {}",
                        s.sale_date,
                        s.book_title.as_deref().unwrap_or("-"),
                        s.marketplace.as_deref().unwrap_or("-"),
                        s.units_sold.map(|u| u.to_string()).unwrap_or_else(|| "-".into()),
                        s.royalty_earned.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
                    )
                },
            )?;
            if let OutputFormat::Text = ctx.output {
                let totals = SalesTotals::from_rows(&sales);
                if totals.rows > 0 {
                    println!("Total: {} units, {} royalty", totals.units_sold, totals.royalty_earned);
                }
            }
            Ok(())
        }
        SalesCommands::Import { file } => {
            let bytes = std::fs::read(&file)
                .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", file.display(), e))?;
            let summary = insights::import_report(&page, bytes).await?;
            output_success(
                &ctx.output,
                &format!(
                    "Report uploaded: {} rows imported, {} skipped",
                    summary.inserted, summary.skipped
                ),
                Some(json!({ "summary": summary })),
            )
        }
    }
}
