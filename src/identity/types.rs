//! Identity records exchanged with the remote service.
//!
//! Field names follow the backend's JSON so these types deserialize
//! straight from GoTrue / PostgREST responses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// USER / PROFILE
// =============================================================================

/// Identity record supplied by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Local extension point; fetched separately and never filled in by the
    /// auth flow itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

impl AuthUser {
    /// `full_name` from sign-up metadata, if any.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata.get("full_name").and_then(serde_json::Value::as_str)
    }
}

/// Row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial profile update. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ProfilePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Token bundle issued by the remote service. Locally only its presence
/// matters; the gateway never inspects the tokens.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    /// Unix seconds. Stamped locally from `expires_in` when the backend omits it.
    #[serde(default)]
    pub expires_at: Option<u64>,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

impl Session {
    /// True when the access token expires within `margin_secs` of `now`.
    /// Sessions without an expiry never count as expired.
    #[must_use]
    pub fn is_expired(&self, now: u64, margin_secs: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now.saturating_add(margin_secs))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user.id)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CHANGE EVENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// One push notification from the remote service: the event and the
/// authoritative session snapshot after it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

// =============================================================================
// CREDENTIALS
// =============================================================================

#[derive(Clone)]
pub struct SignInParams {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct SignUpParams {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl std::fmt::Debug for SignInParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInParams").field("email", &self.email).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for SignUpParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpParams")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Result of a sign-up. `session` is `None` while e-mail confirmation is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<Session>,
}
