//! Supabase-compatible identity client.
//!
//! Thin HTTP wrapper over GoTrue (`/auth/v1`) for credentials and sessions
//! and PostgREST (`/rest/v1`) for profile rows. Response parsing lives in
//! pure functions for testability.
//!
//! SESSION LIFECYCLE
//! =================
//! Issued sessions are written to a [`SessionStorage`] and announced on a
//! broadcast channel, so every [`Subscription`] sees sign-in, sign-out and
//! token refresh as they happen. `get_session` refreshes an access token
//! that is about to expire before handing it out.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::storage::{FileStorage, MemoryStorage, SessionStorage};
use super::{
    AuthChange, AuthEvent, AuthUser, IdentityError, IdentityService, Session, SignInParams, SignUpOutcome,
    SignUpParams, Subscription,
};
use crate::config::AuthConfig;

const CHANGE_CHANNEL_CAPACITY: usize = 16;
const EXPIRY_MARGIN_SECS: u64 = 10;

// =============================================================================
// CLIENT
// =============================================================================

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    storage: Box<dyn SessionStorage>,
    changes: broadcast::Sender<AuthChange>,
}

impl SupabaseClient {
    /// Build a client from config, persisting to `session_file` when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &AuthConfig) -> Result<Self, IdentityError> {
        let storage: Box<dyn SessionStorage> = match &config.session_file {
            Some(path) => Box::new(FileStorage::new(path)),
            None => Box::new(MemoryStorage::default()),
        };
        Self::new(config, storage)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &AuthConfig, storage: Box<dyn SessionStorage>) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| IdentityError::HttpClientBuild(e.to_string()))?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            http,
            base_url: config.supabase_url.trim_end_matches('/').to_owned(),
            anon_key: config.anon_key.clone(),
            storage,
            changes,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// Bearer for data calls: the user's access token when signed in,
    /// otherwise the anon key.
    fn bearer(&self) -> Result<String, IdentityError> {
        Ok(self
            .storage
            .load()?
            .map_or_else(|| self.anon_key.clone(), |s| s.access_token))
    }

    fn emit(&self, event: AuthEvent, session: Option<Session>) {
        debug!(?event, subscribers = self.changes.receiver_count(), "auth change");
        // No subscribers is fine; nobody is mounted yet.
        let _ = self.changes.send(AuthChange { event, session });
    }

    fn persist(&self, event: AuthEvent, session: Session) -> Result<Session, IdentityError> {
        self.storage.save(&session)?;
        self.emit(event, Some(session.clone()));
        Ok(session)
    }

    fn forget(&self) -> Result<(), IdentityError> {
        self.storage.clear()?;
        self.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, IdentityError> {
        let response = request
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(IdentityError::Response { status, message: parse_error_message(&text) });
        }
        Ok(text)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        let body = self
            .send(
                self.http
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "refresh_token")])
                    .bearer_auth(&self.anon_key)
                    .json(&serde_json::json!({ "refresh_token": refresh_token })),
            )
            .await?;
        parse_session(&body, unix_now())
    }
}

#[async_trait::async_trait]
impl IdentityService for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, IdentityError> {
        let Some(session) = self.storage.load()? else {
            return Ok(None);
        };
        if !session.is_expired(unix_now(), EXPIRY_MARGIN_SECS) {
            return Ok(Some(session));
        }

        debug!(user_id = %session.user.id, "access token expired; refreshing");
        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => self.persist(AuthEvent::TokenRefreshed, fresh).map(Some),
            // The service rejected the refresh token: the session is over.
            Err(IdentityError::Response { status, message }) => {
                warn!(status, %message, "session refresh rejected; signing out locally");
                self.forget()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.changes.subscribe())
    }

    async fn sign_in_with_password(&self, params: &SignInParams) -> Result<Session, IdentityError> {
        let body = self
            .send(
                self.http
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "password")])
                    .bearer_auth(&self.anon_key)
                    .json(&serde_json::json!({ "email": params.email, "password": params.password })),
            )
            .await?;
        let session = parse_session(&body, unix_now())?;
        info!(user_id = %session.user.id, "signed in");
        self.persist(AuthEvent::SignedIn, session)
    }

    async fn sign_up(&self, params: &SignUpParams) -> Result<SignUpOutcome, IdentityError> {
        let body = self
            .send(
                self.http
                    .post(self.auth_url("signup"))
                    .bearer_auth(&self.anon_key)
                    .json(&serde_json::json!({
                        "email": params.email,
                        "password": params.password,
                        "data": { "full_name": params.full_name },
                    })),
            )
            .await?;
        let outcome = parse_sign_up(&body, unix_now())?;
        info!(user_id = %outcome.user.id, confirmed = outcome.session.is_some(), "signed up");
        match outcome.session {
            Some(session) => {
                let session = self.persist(AuthEvent::SignedIn, session)?;
                Ok(SignUpOutcome { user: outcome.user, session: Some(session) })
            }
            None => Ok(outcome),
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let Some(session) = self.storage.load()? else {
            return self.forget();
        };
        let result = self
            .send(
                self.http
                    .post(self.auth_url("logout"))
                    .bearer_auth(&session.access_token),
            )
            .await;
        match result {
            Ok(_) => {}
            // Token already revoked or expired: nothing left to end remotely.
            Err(IdentityError::Response { status: 401 | 403 | 404, .. }) => {
                debug!(user_id = %session.user.id, "remote session already gone");
            }
            Err(e) => return Err(e),
        }
        info!(user_id = %session.user.id, "signed out");
        self.forget()
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        self.send(
            self.http
                .post(self.auth_url("recover"))
                .query(&[("redirect_to", redirect_to)])
                .bearer_auth(&self.anon_key)
                .json(&serde_json::json!({ "email": email })),
        )
        .await?;
        info!(%redirect_to, "password recovery requested");
        Ok(())
    }

    async fn update_record(&self, table: &str, patch: &serde_json::Value, id: Uuid) -> Result<(), IdentityError> {
        let bearer = self.bearer()?;
        self.send(
            self.http
                .patch(self.rest_url(table))
                .query(&[("id", format!("eq.{id}"))])
                .header("Prefer", "return=minimal")
                .bearer_auth(bearer)
                .json(patch),
        )
        .await?;
        debug!(table, %id, "record updated");
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn parse_session(json: &str, now: u64) -> Result<Session, IdentityError> {
    let mut session: Session = serde_json::from_str(json).map_err(|e| IdentityError::Parse(e.to_string()))?;
    if session.expires_at.is_none() && session.expires_in > 0 {
        session.expires_at = Some(now.saturating_add(session.expires_in));
    }
    Ok(session)
}

/// Sign-up answers with a session when the project auto-confirms, and with
/// the bare user while e-mail confirmation is pending.
fn parse_sign_up(json: &str, now: u64) -> Result<SignUpOutcome, IdentityError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| IdentityError::Parse(e.to_string()))?;
    if value.get("access_token").is_some() {
        let session = parse_session(json, now)?;
        return Ok(SignUpOutcome { user: session.user.clone(), session: Some(session) });
    }
    let user: AuthUser = serde_json::from_value(value).map_err(|e| IdentityError::Parse(e.to_string()))?;
    Ok(SignUpOutcome { user, session: None })
}

#[derive(Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// Best human-readable message from a GoTrue or PostgREST error body.
fn parse_error_message(body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = err.msg.or(err.error_description).or(err.message).or(err.error) {
            return msg;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() { "unknown error".to_owned() } else { trimmed.to_owned() }
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
