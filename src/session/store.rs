//! Injectable session store.
//!
//! DESIGN
//! ======
//! Backed by a `tokio::sync::watch` channel: writers replace fields in place
//! and every reader can either snapshot or await the next change. Writes are
//! last-writer-wins with no validation.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;

use tokio::sync::watch;

use super::state::{AuthFailure, SessionState};
use crate::identity::{AuthUser, Session};

#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::initial());
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn set_user(&self, user: Option<AuthUser>) {
        self.tx.send_modify(|s| s.user = user);
    }

    pub fn set_session(&self, session: Option<Session>) {
        self.tx.send_modify(|s| s.session = session);
    }

    pub fn set_loading(&self, loading: bool) {
        self.tx.send_modify(|s| s.loading = loading);
    }

    pub fn set_error(&self, error: Option<AuthFailure>) {
        self.tx.send_modify(|s| s.error = error);
    }

    /// Back to the application-start value.
    pub fn reset(&self) {
        self.tx.send_replace(SessionState::initial());
    }

    /// Adopt an authoritative session snapshot: session, its user, and
    /// loading finished, in one write.
    pub fn apply_session(&self, session: Option<Session>) {
        self.tx.send_modify(|s| {
            s.user = session.as_ref().map(|session| session.user.clone());
            s.session = session;
            s.loading = false;
        });
    }

    /// Wait until loading has finished and return that state.
    pub async fn ready(&self) -> SessionState {
        let mut rx = self.subscribe();
        let ready = rx.wait_for(|s| !s.loading).await.map(|state| SessionState::clone(&state));
        // Closed is unreachable while `self` holds the sender.
        ready.unwrap_or_else(|_| self.snapshot())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
