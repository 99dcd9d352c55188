pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::portal::{PageContext, Portal};
use config::StoredSession;

#[derive(Parser)]
#[command(name = "authornest")]
#[command(about = "AuthorNest CLI - the author portal from the command line")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "AUTHORNEST_SERVER",
        default_value = "http://localhost:3000",
        help = "AuthorNest API base URL"
    )]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in, sign out and account registration")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Show how the portal would render a path")]
    Nav {
        #[arg(help = "Portal path, e.g. /dashboard")]
        path: String,
    },

    #[command(about = "Project planner tasks")]
    Tasks {
        #[command(subcommand)]
        cmd: commands::tasks::TaskCommands,
    },

    #[command(about = "Story Forge manuscripts")]
    Manuscripts {
        #[command(subcommand)]
        cmd: commands::manuscripts::ManuscriptCommands,
    },

    #[command(about = "Insights Board sales data")]
    Sales {
        #[command(subcommand)]
        cmd: commands::sales::SalesCommands,
    },

    #[command(about = "Profile and appearance settings")]
    Settings {
        #[command(subcommand)]
        cmd: commands::settings::SettingsCommands,
    },

    #[command(about = "Show the dashboard greeting and quick links")]
    Dashboard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// A started portal plus the persisted session it was restored from.
pub struct CliContext {
    pub portal: Portal,
    pub server: String,
    pub output: OutputFormat,
}

impl CliContext {
    pub async fn connect(server: &str, output: OutputFormat) -> anyhow::Result<Self> {
        let portal = Portal::connect(server)?;

        let stored = config::load_session()?;
        if let Some(stored) = stored.filter(|s| s.server == server) {
            if !portal.session().restore(stored.session) {
                debug!("Stored session has expired");
            }
        }
        portal.start().await;

        let context = Self {
            portal,
            server: server.to_string(),
            output,
        };
        context.persist()?;
        Ok(context)
    }

    /// Writes the current session to disk, or removes it once signed out.
    pub fn persist(&self) -> anyhow::Result<()> {
        match self.portal.session().current_session() {
            Some(session) => config::save_session(&StoredSession::new(&self.server, session)),
            None => config::clear_session(),
        }
    }

    pub fn page(&self) -> anyhow::Result<PageContext> {
        self.portal
            .page()
            .map_err(|_| anyhow::anyhow!("Not signed in. Run 'authornest auth login' first."))
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = CliContext::connect(&cli.server, output_format).await?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx).await,
        Commands::Nav { path } => commands::nav::handle(&path, &ctx).await,
        Commands::Tasks { cmd } => commands::tasks::handle(cmd, &ctx).await,
        Commands::Manuscripts { cmd } => commands::manuscripts::handle(cmd, &ctx).await,
        Commands::Sales { cmd } => commands::sales::handle(cmd, &ctx).await,
        Commands::Settings { cmd } => commands::settings::handle(cmd, &ctx).await,
        Commands::Dashboard => commands::dashboard::handle(&ctx).await,
    }
}
