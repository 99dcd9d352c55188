use thiserror::Error;

use super::chrome::Chrome;
use super::profile::ProfileState;
use crate::database::models::Role;

/// Where signed-out visitors are sent. It is the login page.
pub const LOGIN_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BareRule {
    Exact(String),
    Prefix(String),
}

impl BareRule {
    fn matches(&self, path: &str) -> bool {
        match self {
            BareRule::Exact(exact) => path == exact,
            BareRule::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// Render the page without navigation chrome.
    Bare,
    /// Protected page while the profile is still resolving.
    Loading,
    /// Render inside the authenticated shell.
    Chrome(Chrome),
    /// Navigate elsewhere instead of rendering.
    Redirect(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum GateError {
    #[error("redirect target '{0}' is not a bare route")]
    RedirectNotBare(String),
}

/// Picks the layout for a navigation and sends signed-out visitors of
/// protected pages back to the login page.
#[derive(Debug, Clone)]
pub struct RouteGate {
    bare: Vec<BareRule>,
    redirect_to: String,
}

impl Default for RouteGate {
    fn default() -> Self {
        Self {
            bare: vec![
                BareRule::Exact("/".into()),
                BareRule::Prefix("/sites/".into()),
                BareRule::Prefix("/signup".into()),
            ],
            redirect_to: LOGIN_PATH.into(),
        }
    }
}

impl RouteGate {
    /// The redirect target has to render bare, otherwise a signed-out
    /// visitor would be redirected forever.
    pub fn new(bare: Vec<BareRule>, redirect_to: impl Into<String>) -> Result<Self, GateError> {
        let redirect_to = redirect_to.into();
        let gate = Self { bare, redirect_to };
        if !gate.is_bare(&gate.redirect_to) {
            return Err(GateError::RedirectNotBare(gate.redirect_to));
        }
        Ok(gate)
    }

    pub fn is_bare(&self, path: &str) -> bool {
        let path = strip_query(path);
        self.bare.iter().any(|rule| rule.matches(path))
    }

    pub fn decide(&self, path: &str, state: &ProfileState) -> RouteDecision {
        if self.is_bare(path) {
            return RouteDecision::Bare;
        }
        if state.loading {
            return RouteDecision::Loading;
        }
        match &state.profile {
            Some(profile) => RouteDecision::Chrome(Chrome::for_profile(profile, strip_query(path))),
            None => RouteDecision::Redirect(self.redirect_to.clone()),
        }
    }
}

/// Landing page after sign-in.
pub fn home_for(role: Role) -> &'static str {
    match role {
        Role::Author | Role::SuperAdmin => "/dashboard",
        Role::BetaReader => "/reader/dashboard",
    }
}

fn strip_query(path: &str) -> &str {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    &path[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ThemePreference, UserProfile};
    use uuid::Uuid;

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            instance_id: Uuid::new_v4(),
            full_name: Some("Ada".into()),
            role,
            email: "a@x.com".into(),
            bio: None,
            genre: None,
            theme_preference: ThemePreference::Modern,
            created_at: None,
        }
    }

    fn settled(profile: Option<UserProfile>) -> ProfileState {
        ProfileState { profile, loading: false }
    }

    #[test]
    fn bare_routes() {
        let gate = RouteGate::default();
        for path in ["/", "/sites/jane", "/signup", "/signup/author", "/signup/reader?ref=x", "/?next=/dashboard"] {
            assert!(gate.is_bare(path), "{path} should be bare");
        }
        for path in ["/dashboard", "/settings", "/sites", "/reader/dashboard"] {
            assert!(!gate.is_bare(path), "{path} should not be bare");
        }
    }

    #[test]
    fn loading_shows_placeholder_not_redirect() {
        let gate = RouteGate::default();
        let loading = ProfileState { profile: None, loading: true };
        assert_eq!(gate.decide("/dashboard", &loading), RouteDecision::Loading);
        assert_eq!(gate.decide("/", &loading), RouteDecision::Bare);
    }

    #[test]
    fn signed_out_visitors_are_redirected_to_login() {
        let gate = RouteGate::default();
        assert_eq!(gate.decide("/project-planner", &settled(None)), RouteDecision::Redirect("/".into()));
        assert_eq!(gate.decide("/", &settled(None)), RouteDecision::Bare);
    }

    #[test]
    fn signed_in_users_get_chrome() {
        let gate = RouteGate::default();
        match gate.decide("/settings", &settled(Some(profile(Role::Author)))) {
            RouteDecision::Chrome(chrome) => assert_eq!(chrome.active.as_deref(), Some("/settings")),
            other => panic!("expected chrome, got {:?}", other),
        }
    }

    #[test]
    fn redirect_target_must_be_bare() {
        let err = RouteGate::new(vec![BareRule::Prefix("/sites/".into())], "/login").unwrap_err();
        assert_eq!(err, GateError::RedirectNotBare("/login".into()));
        assert!(RouteGate::new(vec![BareRule::Exact("/login".into())], "/login").is_ok());
    }

    #[test]
    fn home_by_role() {
        assert_eq!(home_for(Role::Author), "/dashboard");
        assert_eq!(home_for(Role::SuperAdmin), "/dashboard");
        assert_eq!(home_for(Role::BetaReader), "/reader/dashboard");
    }
}
