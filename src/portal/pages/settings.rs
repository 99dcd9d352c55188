use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{first, PageContext};
use crate::database::models::{tables, ThemePreference, UserProfile};
use crate::filter::Filter;
use crate::portal::error::ClientError;
use crate::portal::profile::ProfileResolver;

/// Editable profile fields. Blank values are stored as given; the
/// dashboard falls back to "Author" for a blank name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub full_name: String,
    pub genre: String,
    pub bio: String,
}

impl From<&UserProfile> for ProfileForm {
    fn from(profile: &UserProfile) -> Self {
        Self {
            full_name: profile.full_name.clone().unwrap_or_default(),
            genre: profile.genre.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
        }
    }
}

pub async fn update_profile(ctx: &PageContext, resolver: &ProfileResolver, form: &ProfileForm) -> Result<UserProfile, ClientError> {
    let patch = json!({
        "full_name": form.full_name,
        "genre": form.genre,
        "bio": form.bio,
    });
    save(ctx, resolver, patch).await
}

pub async fn update_theme(ctx: &PageContext, resolver: &ProfileResolver, theme: ThemePreference) -> Result<UserProfile, ClientError> {
    save(ctx, resolver, json!({ "theme_preference": theme.as_str() })).await
}

/// Writes the caller's own row, then refreshes the shared profile so the
/// chrome picks up the change.
async fn save(ctx: &PageContext, resolver: &ProfileResolver, patch: Value) -> Result<UserProfile, ClientError> {
    let filter = Filter::new().eq("id", ctx.profile().id);
    let rows = ctx.backend().update(tables::USERS, &filter, patch).await?;
    let updated: UserProfile = first(rows, "Profile")?;
    resolver.refresh().await;
    Ok(updated)
}
