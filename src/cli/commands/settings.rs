use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::CliContext;
use crate::database::models::ThemePreference;
use crate::portal::chrome::ThemeScheme;
use crate::portal::pages::settings::{update_profile, update_theme, ProfileForm};

#[derive(Subcommand)]
pub enum SettingsCommands {
    #[command(about = "Update profile fields; omitted fields keep their value")]
    Profile {
        #[arg(long, help = "Full name")]
        full_name: Option<String>,
        #[arg(long, help = "Primary genre")]
        genre: Option<String>,
        #[arg(long, help = "Short bio")]
        bio: Option<String>,
    },

    #[command(about = "Choose the portal theme: modern, warm or classic")]
    Theme {
        #[arg(help = "Theme name")]
        theme: ThemePreference,
    },
}

pub async fn handle(cmd: SettingsCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let page = ctx.page()?;
    let resolver = ctx.portal.profile();
    match cmd {
        SettingsCommands::Profile { full_name, genre, bio } => {
            let mut form = ProfileForm::from(page.profile());
            if let Some(full_name) = full_name {
                form.full_name = full_name;
            }
            if let Some(genre) = genre {
                form.genre = genre;
            }
            if let Some(bio) = bio {
                form.bio = bio;
            }
            let profile = update_profile(&page, resolver, &form).await?;
            output_success(&ctx.output, "Profile updated!", Some(json!({ "profile": profile })))
        }
        SettingsCommands::Theme { theme } => {
            let profile = update_theme(&page, resolver, theme).await?;
            let scheme = ThemeScheme::for_preference(profile.theme_preference);
            output_success(
                &ctx.output,
                &format!("Theme updated to {}", scheme.label),
                Some(json!({ "theme": scheme })),
            )
        }
    }
}
