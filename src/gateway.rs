//! Auth gateway: the five user-initiated identity operations.
//!
//! DESIGN
//! ======
//! Every operation runs the same bracket:
//!
//! 1. take the in-flight lock and set `loading`
//! 2. call the remote service
//! 3. failure: store the error, notify, leave user/session alone
//! 4. success: write any resulting session directly, notify
//! 5. clear `loading`, always (drop guard, so cancellation clears it too)
//!
//! Operations are serialized so `loading` describes exactly one call. The
//! bootstrap's change subscription still delivers the same snapshots and
//! acts as reconciliation; writes from both sides are idempotent.
//!
//! ERROR HANDLING
//! ==============
//! Failures are caught here: stored in state, surfaced as a notification,
//! and returned to the caller. Nothing is retried.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::identity::{IdentityService, ProfilePatch, Session, SignInParams, SignUpParams};
use crate::notify::{Notification, Notifier};
use crate::session::state::AuthFailure;
use crate::session::store::SessionStore;

pub const PROFILES_TABLE: &str = "profiles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    SignIn,
    SignUp,
    SignOut,
    ResetPassword,
    UpdateProfile,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
            Self::SignOut => "sign_out",
            Self::ResetPassword => "reset_password",
            Self::UpdateProfile => "update_profile",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Self::SignIn => "Signed in successfully!",
            Self::SignUp => "Account created! Check your e-mail to confirm it.",
            Self::SignOut => "Signed out successfully!",
            Self::ResetPassword => "Password recovery e-mail sent!",
            Self::UpdateProfile => "Profile updated!",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Self::SignIn => "Could not sign in",
            Self::SignUp => "Could not create account",
            Self::SignOut => "Could not sign out",
            Self::ResetPassword => "Could not send recovery e-mail",
            Self::UpdateProfile => "Could not update profile",
        }
    }
}

/// State write a successful call asks for.
enum Outcome {
    Nothing,
    Session(Option<Session>),
}

/// Clears `loading` on drop.
struct LoadingGuard<'a> {
    store: &'a SessionStore,
}

impl<'a> LoadingGuard<'a> {
    fn engage(store: &'a SessionStore) -> Self {
        store.set_loading(true);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}

pub struct AuthGateway {
    identity: Arc<dyn IdentityService>,
    store: SessionStore,
    notifier: Arc<dyn Notifier>,
    reset_redirect: String,
    in_flight: Mutex<()>,
}

impl AuthGateway {
    /// `reset_redirect` is the absolute URL recovery e-mails link back to.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        store: SessionStore,
        notifier: Arc<dyn Notifier>,
        reset_redirect: impl Into<String>,
    ) -> Self {
        Self { identity, store, notifier, reset_redirect: reset_redirect.into(), in_flight: Mutex::new(()) }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// # Errors
    ///
    /// Returns the failure that was also stored in state and notified.
    pub async fn sign_in(&self, params: SignInParams) -> Result<(), AuthFailure> {
        self.bracket(Operation::SignIn, async {
            let session = self.identity.sign_in_with_password(&params).await?;
            Ok::<_, AuthFailure>(Outcome::Session(Some(session)))
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the failure that was also stored in state and notified.
    pub async fn sign_up(&self, params: SignUpParams) -> Result<(), AuthFailure> {
        self.bracket(Operation::SignUp, async {
            let outcome = self.identity.sign_up(&params).await?;
            // Pending e-mail confirmation leaves the user signed out.
            Ok::<_, AuthFailure>(match outcome.session {
                Some(session) => Outcome::Session(Some(session)),
                None => Outcome::Nothing,
            })
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the failure that was also stored in state and notified.
    pub async fn sign_out(&self) -> Result<(), AuthFailure> {
        self.bracket(Operation::SignOut, async {
            self.identity.sign_out().await?;
            Ok::<_, AuthFailure>(Outcome::Session(None))
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the failure that was also stored in state and notified.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthFailure> {
        self.bracket(Operation::ResetPassword, async {
            self.identity.reset_password_for_email(email, &self.reset_redirect).await?;
            Ok::<_, AuthFailure>(Outcome::Nothing)
        })
        .await
    }

    /// Patch the signed-in user's profile row. Fails fast with
    /// [`AuthFailure::NotAuthenticated`] when nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns the failure that was also stored in state and notified.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<(), AuthFailure> {
        self.bracket(Operation::UpdateProfile, async {
            let user_id = self
                .store
                .snapshot()
                .user
                .map(|user| user.id)
                .ok_or(AuthFailure::NotAuthenticated)?;
            let body = serde_json::to_value(&patch).map_err(|e| AuthFailure::Remote(e.to_string()))?;
            self.identity.update_record(PROFILES_TABLE, &body, user_id).await?;
            Ok::<_, AuthFailure>(Outcome::Nothing)
        })
        .await
    }

    async fn bracket<F>(&self, op: Operation, call: F) -> Result<(), AuthFailure>
    where
        F: Future<Output = Result<Outcome, AuthFailure>>,
    {
        let _serial = self.in_flight.lock().await;
        let _loading = LoadingGuard::engage(&self.store);
        debug!(op = op.name(), "auth operation started");

        match call.await {
            Ok(outcome) => {
                if let Outcome::Session(session) = outcome {
                    self.store.apply_session(session);
                }
                info!(op = op.name(), "auth operation succeeded");
                self.notifier.notify(Notification::success(op.success_message()));
                Ok(())
            }
            Err(failure) => {
                warn!(op = op.name(), error = %failure, "auth operation failed");
                self.store.set_error(Some(failure.clone()));
                self.notifier.notify(Notification::failure(op.failure_message()));
                Err(failure)
            }
        }
    }
}
