//! Route guard for protected pages.
//!
//! State machine per guarded path:
//!
//! ```text
//! loading ──► user present  ──► Render
//!         └─► no user       ──► Redirect (once) ──► Placeholder
//! ```
//!
//! A user appearing re-arms the redirect, so every signed-out period gets
//! exactly one.
//!
//! No retry and no timeout: a loading flag that never clears keeps the
//! placeholder up.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use tracing::debug;

use crate::identity::AuthUser;
use crate::routes::login_redirect;
use crate::session::state::SessionState;
use crate::session::store::SessionStore;

/// What the protected subtree should show right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    /// Spinner; no navigation.
    Placeholder,
    /// Navigate (replacing history) to this login URL.
    Redirect(String),
    Render,
}

/// Settled decision once loading has finished.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Authenticated(AuthUser),
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    path: String,
    redirected: bool,
}

impl RouteGuard {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), redirected: false }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Evaluate `state`. The redirect is issued once per signed-out period;
    /// while it is being followed the guard keeps showing the placeholder.
    pub fn poll(&mut self, state: &SessionState) -> GuardView {
        if state.loading {
            return GuardView::Placeholder;
        }
        if state.user.is_some() {
            self.redirected = false;
            return GuardView::Render;
        }
        if self.redirected {
            return GuardView::Placeholder;
        }
        self.redirected = true;
        let target = login_redirect(&self.path);
        debug!(from = %self.path, %target, "unauthenticated; redirecting");
        GuardView::Redirect(target)
    }

    /// Wait for loading to finish, then decide.
    pub async fn resolve(&mut self, store: &SessionStore) -> GuardOutcome {
        let state = store.ready().await;
        match state.user {
            Some(user) => {
                self.redirected = false;
                GuardOutcome::Authenticated(user)
            }
            None => {
                self.redirected = true;
                GuardOutcome::Redirect(login_redirect(&self.path))
            }
        }
    }
}
