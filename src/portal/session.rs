use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{Backend, Session};
use super::error::ClientError;
use crate::services::{SignUpAttributes, SignUpOutcome};

/// Identity change broadcast to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

#[derive(Default)]
struct Inner {
    session: Option<Session>,
    subscribers: HashMap<u64, mpsc::UnboundedSender<AuthEvent>>,
    next_id: u64,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the current session and notifies subscribers when it changes.
///
/// Cloning yields another handle onto the same store. Events are delivered
/// by message passing: each subscriber owns a channel receiver, so no
/// caller-supplied closure is ever captured by the store.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn Backend>,
    inner: Arc<Mutex<Inner>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// The live session, or None when signed out or expired.
    pub fn current_session(&self) -> Option<Session> {
        lock(&self.inner).session.clone().filter(|s| !s.is_expired())
    }

    /// Signs in. A failure leaves the stored session untouched.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let session = self.backend.sign_in(email, password).await?;
        info!("Signed in as {}", session.user_id);
        self.install(session.clone());
        Ok(session)
    }

    /// Registers a new account. Does not sign in: the account may need
    /// confirmation first.
    pub async fn sign_up(&self, email: &str, password: &str, attributes: &SignUpAttributes) -> Result<SignUpOutcome, ClientError> {
        self.backend.sign_up(email, password, attributes).await
    }

    /// Clears the session locally even when the backend call fails.
    pub async fn sign_out(&self) {
        if self.current_session().is_some() {
            if let Err(e) = self.backend.sign_out().await {
                warn!("Backend sign-out failed, clearing local session anyway: {}", e);
            }
        }
        self.backend.set_session(None);
        lock(&self.inner).session = None;
        self.emit(AuthEvent::SignedOut);
    }

    /// Reinstates a previously persisted session. Expired sessions are
    /// ignored.
    pub fn restore(&self, session: Session) -> bool {
        if session.is_expired() {
            debug!("Ignoring expired session for {}", session.user_id);
            return false;
        }
        self.install(session);
        true
    }

    /// Swaps the token for a fresh one. The subject is unchanged, so
    /// subscribers are not notified.
    pub async fn refresh_session(&self) -> Result<Session, ClientError> {
        if self.current_session().is_none() {
            return Err(ClientError::Auth("Not signed in".into()));
        }
        let session = self.backend.refresh_session().await?;
        self.backend.set_session(Some(&session));
        lock(&self.inner).session = Some(session.clone());
        Ok(session)
    }

    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, sender);
        Subscription {
            id,
            receiver,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }

    fn install(&self, session: Session) {
        self.backend.set_session(Some(&session));
        lock(&self.inner).session = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session));
    }

    fn emit(&self, event: AuthEvent) {
        let mut inner = lock(&self.inner);
        inner.subscribers.retain(|_, sender| sender.send(event.clone()).is_ok());
    }
}

/// Receiving end of a [`SessionStore`] subscription. Dropping it, or calling
/// [`Subscription::unsubscribe`], detaches it from the store.
pub struct Subscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<AuthEvent>,
    store: Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Next event, or None once the store is gone.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            lock(&inner).subscribers.remove(&self.id);
        }
    }
}
