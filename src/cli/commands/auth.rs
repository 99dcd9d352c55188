use clap::{Subcommand, ValueEnum};
use serde_json::json;

use crate::cli::utils::{output_record, output_success};
use crate::cli::CliContext;
use crate::portal::pages::login::login;
use crate::portal::pages::signup::{confirmation_notice, sign_up, SignUpForm};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SignupRole {
    Author,
    Reader,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in with email and password")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, env = "AUTHORNEST_PASSWORD", hide_env_values = true, help = "Password")]
        password: String,
    },

    #[command(about = "Sign out and forget the stored session")]
    Logout,

    #[command(about = "Create an author or beta reader account")]
    Signup {
        #[arg(help = "Full name")]
        full_name: String,
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, env = "AUTHORNEST_PASSWORD", hide_env_values = true, help = "Password (at least 6 characters)")]
        password: String,
        #[arg(long, value_enum, default_value = "author", help = "Account type")]
        role: SignupRole,
        #[arg(long, help = "Favorite genres (readers) or primary genre (authors)")]
        genre: Option<String>,
    },

    #[command(about = "Show the signed-in user and profile")]
    Whoami,

    #[command(about = "Exchange the session token for a fresh one")]
    Refresh,
}

pub async fn handle(cmd: AuthCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let portal = &ctx.portal;
    match cmd {
        AuthCommands::Login { email, password } => {
            let backend = portal.backend();
            let outcome = login(portal.session(), backend.as_ref(), &email, &password).await?;
            ctx.persist()?;
            output_success(
                &ctx.output,
                &format!("Signed in as {} ({})", outcome.profile.display_name(), outcome.profile.role),
                Some(json!({ "redirect_to": outcome.redirect_to, "user_id": outcome.session.user_id })),
            )
        }
        AuthCommands::Logout => {
            portal.session().sign_out().await;
            ctx.persist()?;
            output_success(&ctx.output, "Signed out", None)
        }
        AuthCommands::Signup { full_name, email, password, role, genre } => {
            let mut form = match role {
                SignupRole::Author => SignUpForm::author(full_name, email, password),
                SignupRole::Reader => SignUpForm::reader(full_name, email, password, ""),
            };
            form.genre = genre;

            let outcome = sign_up(portal.session(), &form).await?;
            output_success(
                &ctx.output,
                &confirmation_notice(form.role, &outcome),
                Some(json!({
                    "user_id": outcome.user_id,
                    "instance_id": outcome.instance_id,
                    "confirmation_required": outcome.confirmation_required,
                })),
            )
        }
        AuthCommands::Whoami => {
            let session = portal
                .session()
                .current_session()
                .ok_or_else(|| anyhow::anyhow!("Not signed in"))?;
            let profile = portal.profile().profile();
            let mut lines = vec![
                ("Email", session.email.clone()),
                ("User", session.user_id.to_string()),
                ("Expires", session.expires_at.to_rfc3339()),
            ];
            if let Some(profile) = &profile {
                lines.push(("Name", profile.display_name().to_string()));
                lines.push(("Role", profile.role.to_string()));
                lines.push(("Instance", profile.instance_id.to_string()));
                lines.push(("Theme", profile.theme_preference.to_string()));
            }
            output_record(
                &ctx.output,
                "whoami",
                &json!({ "session": session, "profile": profile }),
                &lines,
            )
        }
        AuthCommands::Refresh => {
            let session = portal.session().refresh_session().await?;
            ctx.persist()?;
            output_success(
                &ctx.output,
                &format!("Session refreshed until {}", session.expires_at.to_rfc3339()),
                None,
            )
        }
    }
}
