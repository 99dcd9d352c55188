//! Client core of the author portal: session handling, profile resolution,
//! route gating and the feature pages, all over a [`Backend`].

pub mod backend;
pub mod chrome;
pub mod error;
pub mod pages;
pub mod profile;
pub mod route_gate;
pub mod session;

use std::sync::Arc;

pub use backend::{Backend, HttpBackend, Session};
pub use chrome::{Chrome, NavItem, ThemeScheme};
pub use error::ClientError;
pub use pages::PageContext;
pub use profile::{ProfileResolver, ProfileState};
pub use route_gate::{home_for, BareRule, GateError, RouteDecision, RouteGate, LOGIN_PATH};
pub use session::{AuthEvent, SessionStore, Subscription};

/// One portal instance. Owns the shared state every page reads.
pub struct Portal {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    profile: ProfileResolver,
    gate: RouteGate,
}

impl Portal {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_gate(backend, RouteGate::default())
    }

    pub fn with_gate(backend: Arc<dyn Backend>, gate: RouteGate) -> Self {
        let session = SessionStore::new(backend.clone());
        let profile = ProfileResolver::new(backend.clone(), session.clone());
        Self {
            backend,
            session,
            profile,
            gate,
        }
    }

    /// Portal over the HTTP API at `base_url`.
    pub fn connect(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(HttpBackend::new(base_url)?)))
    }

    /// Starts profile resolution. Restore any persisted session first so
    /// the initial refresh sees it.
    pub async fn start(&self) {
        self.profile.start().await;
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn profile(&self) -> &ProfileResolver {
        &self.profile
    }

    pub fn gate(&self) -> &RouteGate {
        &self.gate
    }

    /// Decision for `path` against the current state, possibly `Loading`.
    pub fn decide(&self, path: &str) -> RouteDecision {
        self.gate.decide(path, &self.profile.snapshot())
    }

    /// Decision for `path` once the profile has settled.
    pub async fn navigate(&self, path: &str) -> RouteDecision {
        let state = self.profile.settled().await;
        self.gate.decide(path, &state)
    }

    pub fn page(&self) -> Result<PageContext, ClientError> {
        PageContext::from_resolver(self.backend.clone(), &self.profile)
    }
}
