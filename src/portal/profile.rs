//! Keeps `{profile, loading}` in step with the current session.
//!
//! Every refresh takes a new generation number. A completion is applied only
//! while its generation is still current, so a slow lookup that started
//! before a sign-out can never bring the old profile back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::Backend;
use super::error::ClientError;
use super::session::{AuthEvent, SessionStore};
use crate::database::models::{tables, UserProfile};
use crate::filter::Filter;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileState {
    pub profile: Option<UserProfile>,
    pub loading: bool,
}

impl ProfileState {
    fn initial() -> Self {
        Self { profile: None, loading: true }
    }
}

struct Inner {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    generation: Mutex<u64>,
    state: watch::Sender<ProfileState>,
    started: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let listener = self.listener.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = listener {
            handle.abort();
        }
    }
}

/// Explicit state container for the signed-in user's profile. Owned by the
/// top-level [`super::Portal`] and handed to whatever needs to read it.
#[derive(Clone)]
pub struct ProfileResolver {
    inner: Arc<Inner>,
}

impl ProfileResolver {
    pub fn new(backend: Arc<dyn Backend>, session: SessionStore) -> Self {
        let (state, _) = watch::channel(ProfileState::initial());
        Self {
            inner: Arc::new(Inner {
                backend,
                session,
                generation: Mutex::new(0),
                state,
                started: AtomicBool::new(false),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Subscribes to session events and runs the initial refresh. Only the
    /// first call has any effect.
    pub async fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut subscription = self.inner.session.subscribe();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                ProfileResolver { inner }.handle_event(event);
            }
        });
        *self.inner.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        self.refresh().await;
    }

    /// SIGNED_IN schedules a refresh; SIGNED_OUT clears the profile at once
    /// and invalidates any lookup still in flight.
    pub fn handle_event(&self, event: AuthEvent) -> Option<JoinHandle<()>> {
        match event {
            AuthEvent::SignedIn(session) => {
                debug!("Session event: signed in as {}", session.user_id);
                let resolver = self.clone();
                Some(tokio::spawn(async move { resolver.refresh().await }))
            }
            AuthEvent::SignedOut => {
                debug!("Session event: signed out");
                self.clear();
                None
            }
        }
    }

    pub async fn refresh(&self) {
        let stamp = self.begin();

        let Some(session) = self.inner.session.current_session() else {
            self.apply(stamp, |state| {
                state.profile = None;
                state.loading = false;
            });
            return;
        };

        let lookup = self
            .inner
            .backend
            .select_one(tables::USERS, &Filter::new().eq("id", session.user_id))
            .await
            .and_then(|row| match row {
                Some(row) => serde_json::from_value::<UserProfile>(row)
                    .map_err(|e| ClientError::Backend { status: 200, message: format!("malformed profile row: {}", e) }),
                None => Err(ClientError::NotFound(format!("No profile for {}", session.user_id))),
            });

        match lookup {
            Ok(profile) => {
                self.apply(stamp, |state| {
                    state.profile = Some(profile);
                    state.loading = false;
                });
            }
            Err(ClientError::NotFound(message)) => {
                let current = self.apply(stamp, |state| {
                    state.profile = None;
                    state.loading = false;
                });
                if current {
                    warn!("{}; signing out", message);
                    self.inner.session.sign_out().await;
                }
            }
            Err(e) => {
                let current = self.apply(stamp, |state| state.loading = false);
                if current {
                    warn!("Profile refresh failed, keeping previous profile: {}", e);
                }
            }
        }
    }

    pub fn snapshot(&self) -> ProfileState {
        self.inner.state.borrow().clone()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.state.borrow().profile.clone()
    }

    pub fn watch(&self) -> watch::Receiver<ProfileState> {
        self.inner.state.subscribe()
    }

    /// Resolves once `loading` is false, returning the settled state.
    pub async fn settled(&self) -> ProfileState {
        let mut receiver = self.watch();
        let settled = match receiver.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    fn begin(&self) -> u64 {
        let mut generation = self.inner.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        self.inner.state.send_modify(|state| state.loading = true);
        *generation
    }

    fn clear(&self) {
        let mut generation = self.inner.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        self.inner.state.send_modify(|state| {
            state.profile = None;
            state.loading = false;
        });
        info!("Profile cleared");
    }

    /// Applies `update` if `stamp` is still the current generation.
    fn apply(&self, stamp: u64, update: impl FnOnce(&mut ProfileState)) -> bool {
        let generation = self.inner.generation.lock().unwrap_or_else(PoisonError::into_inner);
        if *generation != stamp {
            debug!("Discarding stale profile completion (generation {} < {})", stamp, *generation);
            return false;
        }
        self.inner.state.send_modify(update);
        true
    }
}
