
use crate::database::models::Role;
use crate::portal::error::ClientError;
use crate::portal::session::SessionStore;
use crate::services::{validate_email_format, SignUpAttributes, SignUpOutcome};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration form shared by the author and reader sign-up pages.
#[derive(Debug, Clone)]
pub struct SignUpForm {
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub password: String,
    /// Favourite genres for readers, primary genre for authors
    pub genre: Option<String>,
}

impl SignUpForm {
    pub fn author(full_name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            role: Role::Author,
            full_name: full_name.into(),
            email: email.into(),
            password: password.into(),
            genre: None,
        }
    }

    pub fn reader(full_name: impl Into<String>, email: impl Into<String>, password: impl Into<String>, genres: impl Into<String>) -> Self {
        Self {
            role: Role::BetaReader,
            genre: Some(genres.into()),
            ..Self::author(full_name, email, password)
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.role == Role::SuperAdmin {
            return Err(ClientError::validation("Super admin accounts cannot be created here"));
        }
        if self.full_name.trim().is_empty() {
            return Err(ClientError::validation("Full name is required"));
        }
        if validate_email_format(self.email.trim()).is_err() {
            return Err(ClientError::validation("A valid email address is required"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ClientError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.role == Role::BetaReader && self.genre.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(ClientError::validation("Favorite genres are required"));
        }
        Ok(())
    }

    fn attributes(&self) -> SignUpAttributes {
        SignUpAttributes {
            role: self.role,
            full_name: self.full_name.trim().to_string(),
            genre: self
                .genre
                .as_deref()
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string),
        }
    }
}

/// Registers the account. The caller is sent back to the login page
/// afterwards; nobody is signed in here.
pub async fn sign_up(session: &SessionStore, form: &SignUpForm) -> Result<SignUpOutcome, ClientError> {
    form.validate()?;
    session
        .sign_up(form.email.trim(), &form.password, &form.attributes())
        .await
}

/// Message shown after a successful registration.
pub fn confirmation_notice(role: Role, outcome: &SignUpOutcome) -> String {
    let who = match role {
        Role::BetaReader => "Beta Reader account",
        _ => "Author account",
    };
    if outcome.confirmation_required {
        format!("{} created! Please check your email to confirm and then log in.", who)
    } else {
        format!("{} created! You can now log in.", who)
    }
}
