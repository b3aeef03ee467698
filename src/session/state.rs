//! Session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by route guards and user-aware views; written only through
//! [`crate::session::store::SessionStore`].

use crate::identity::{AuthUser, IdentityError, Session};

/// The one error kind the shell surfaces, stored verbatim in state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("remote identity operation failed: {0}")]
    Remote(String),
    /// Raised locally before any remote call is made.
    #[error("no authenticated user")]
    NotAuthenticated,
}

impl From<IdentityError> for AuthFailure {
    fn from(err: IdentityError) -> Self {
        Self::Remote(err.to_string())
    }
}

/// `user` and `session` travel together; nothing in the type enforces it,
/// writers go through `SessionStore::apply_session` to keep them paired.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<AuthFailure>,
}

impl SessionState {
    /// Application-start value: nothing known yet, still loading.
    #[must_use]
    pub fn initial() -> Self {
        Self { user: None, session: None, loading: true, error: None }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}
