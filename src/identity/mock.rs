//! In-memory identity service and fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, broadcast};
use uuid::Uuid;

use super::*;
use crate::session::store::SessionStore;

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn dummy_user(email: &str) -> AuthUser {
    AuthUser {
        id: Uuid::from_u128(0x00c0_ffee),
        email: Some(email.to_owned()),
        user_metadata: serde_json::json!({ "full_name": "Ada Lovelace" }),
        created_at: Some("2024-01-01T00:00:00Z".to_owned()),
        profile: None,
    }
}

pub(crate) fn dummy_session(email: &str) -> Session {
    Session {
        access_token: "access-token".to_owned(),
        refresh_token: "refresh-token".to_owned(),
        token_type: "bearer".to_owned(),
        expires_in: 3600,
        expires_at: Some(4_000_000_000),
        user: dummy_user(email),
    }
}

/// Scriptable stand-in for the hosted service.
///
/// Successful sign-in/up/out announce the change on the broadcast channel
/// the way the real service does.
pub(crate) struct MockIdentity {
    changes: broadcast::Sender<AuthChange>,
    /// Returned by `get_session`.
    pub(crate) current: Mutex<Option<Session>>,
    /// When set, every call fails with this status and message.
    pub(crate) failure: Mutex<Option<(u16, String)>>,
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) released: Arc<AtomicUsize>,
    /// When set, remote calls record the store's loading flag mid-flight.
    pub(crate) observed: Mutex<Option<SessionStore>>,
    pub(crate) loading_seen: Mutex<Vec<bool>>,
    /// When set, remote calls park until notified.
    pub(crate) gate: Mutex<Option<Arc<Notify>>>,
}

impl MockIdentity {
    pub(crate) fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            changes,
            current: Mutex::new(None),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            released: Arc::new(AtomicUsize::new(0)),
            observed: Mutex::new(None),
            loading_seen: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    pub(crate) fn failing(status: u16, message: &str) -> Self {
        let mock = Self::new();
        *mock.failure.lock().unwrap() = Some((status, message.to_owned()));
        mock
    }

    pub(crate) fn emit(&self, event: AuthEvent, session: Option<Session>) {
        let _ = self.changes.send(AuthChange { event, session });
    }

    pub(crate) fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: String) -> Result<(), IdentityError> {
        self.calls.lock().unwrap().push(call);
        let observed = self.observed.lock().unwrap().clone();
        if let Some(store) = observed {
            self.loading_seen.lock().unwrap().push(store.snapshot().loading);
        }
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(IdentityError::Response { status, message }),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl IdentityService for MockIdentity {
    async fn get_session(&self) -> Result<Option<Session>, IdentityError> {
        self.enter("get_session".to_owned()).await?;
        Ok(self.current.lock().unwrap().clone())
    }

    fn subscribe(&self) -> Subscription {
        let released = Arc::clone(&self.released);
        Subscription::with_release(self.changes.subscribe(), move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn sign_in_with_password(&self, params: &SignInParams) -> Result<Session, IdentityError> {
        self.enter(format!("sign_in:{}", params.email)).await?;
        if params.password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Response {
                status: 422,
                message: format!("Password should be at least {MIN_PASSWORD_LEN} characters"),
            });
        }
        let session = dummy_session(&params.email);
        *self.current.lock().unwrap() = Some(session.clone());
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, params: &SignUpParams) -> Result<SignUpOutcome, IdentityError> {
        self.enter(format!("sign_up:{}:{}", params.email, params.full_name)).await?;
        Ok(SignUpOutcome { user: dummy_user(&params.email), session: None })
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.enter("sign_out".to_owned()).await?;
        *self.current.lock().unwrap() = None;
        self.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        self.enter(format!("reset:{email}:{redirect_to}")).await
    }

    async fn update_record(&self, table: &str, patch: &serde_json::Value, id: Uuid) -> Result<(), IdentityError> {
        self.enter(format!("update:{table}:{id}:{patch}")).await
    }
}
