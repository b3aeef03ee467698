//! Identity: seam to the hosted identity service.
//!
//! DESIGN
//! ======
//! The backend is an opaque collaborator. `IdentityService` is the only
//! surface the gateway and bootstrap touch, so tests plug in mocks and the
//! binary plugs in [`supabase::SupabaseClient`]. Change notifications fan
//! out over a `tokio::sync::broadcast` channel; each subscriber holds a
//! [`Subscription`] whose release hook runs exactly once.

#[cfg(test)]
pub(crate) mod mock;
pub mod storage;
pub mod supabase;
pub mod types;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use uuid::Uuid;

pub use types::{
    AuthChange, AuthEvent, AuthUser, Profile, ProfilePatch, Session, SignInParams, SignUpOutcome, SignUpParams,
};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by identity-service calls.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The HTTP request never produced a response.
    #[error("identity request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("identity service returned {status}: {message}")]
    Response { status: u16, message: String },

    /// The response body could not be deserialized.
    #[error("identity response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The local session store could not be read or written.
    #[error("session storage failed: {0}")]
    Storage(String),
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Handle on the remote session-change stream.
///
/// Releasing (explicitly via [`Subscription::unsubscribe`] or by drop) runs
/// the release hook once.
pub struct Subscription {
    rx: broadcast::Receiver<AuthChange>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    #[must_use]
    pub fn new(rx: broadcast::Receiver<AuthChange>) -> Self {
        Self { rx, release: None }
    }

    #[must_use]
    pub fn with_release(rx: broadcast::Receiver<AuthChange>, release: impl FnOnce() + Send + 'static) -> Self {
        Self { rx, release: Some(Box::new(release)) }
    }

    /// Next change, or `None` once the service side has gone away.
    ///
    /// A lagging receiver skips to the newest events; every event carries a
    /// full snapshot so nothing is lost but intermediate states.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth change subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

// =============================================================================
// SERVICE TRAIT
// =============================================================================

/// Operations consumed from the remote identity service.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Current session, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the session cannot be read or refreshed.
    async fn get_session(&self) -> Result<Option<Session>, IdentityError>;

    /// Open a push stream of session changes.
    fn subscribe(&self) -> Subscription;

    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the credentials are rejected or the call fails.
    async fn sign_in_with_password(&self, params: &SignInParams) -> Result<Session, IdentityError>;

    /// Register a user; `full_name` travels as user metadata. Verification
    /// is sent out-of-band by the service.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if registration is rejected or the call fails.
    async fn sign_up(&self, params: &SignUpParams) -> Result<SignUpOutcome, IdentityError>;

    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the remote sign-out fails.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Send a recovery e-mail linking back to `redirect_to`.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the request is rejected or fails.
    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError>;

    /// Patch the row of `table` whose `id` equals `id`.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the update is rejected or fails.
    async fn update_record(&self, table: &str, patch: &serde_json::Value, id: Uuid) -> Result<(), IdentityError>;
}
