//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::routes::AppRoute;

pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Where the identity backend lives and how the shell reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Project base URL, without trailing slash (e.g. `https://xyz.supabase.co`).
    pub supabase_url: String,
    /// Public anon key sent as `apikey` on every request.
    pub anon_key: String,
    /// Origin the end user's browser reaches the shell on. Used to build the
    /// password-recovery redirect.
    pub app_origin: String,
    /// Persist the session to this JSON file. `None` keeps it in memory.
    pub session_file: Option<PathBuf>,
    pub timeouts: HttpTimeouts,
}

impl AuthConfig {
    /// Config with defaults for everything but the backend location.
    #[must_use]
    pub fn new(supabase_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            supabase_url: supabase_url.into().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
            app_origin: DEFAULT_APP_ORIGIN.to_owned(),
            session_file: None,
            timeouts: HttpTimeouts::default(),
        }
    }

    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `AUTH_SUPABASE_URL`
    /// - `AUTH_SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `AUTH_APP_ORIGIN`: default `http://localhost:5173`
    /// - `AUTH_SESSION_FILE`: in-memory session when absent
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a URL does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = required("AUTH_SUPABASE_URL")?;
        let anon_key = required("AUTH_SUPABASE_ANON_KEY")?;
        let supabase_url = parse_url("AUTH_SUPABASE_URL", &supabase_url)?;

        let app_origin = match std::env::var("AUTH_APP_ORIGIN") {
            Ok(raw) => parse_url("AUTH_APP_ORIGIN", &raw)?,
            Err(_) => DEFAULT_APP_ORIGIN.to_owned(),
        };
        let session_file = std::env::var("AUTH_SESSION_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("AUTH_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("AUTH_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { supabase_url, anon_key, app_origin, session_file, timeouts })
    }

    /// Let an explicit path win over `AUTH_SESSION_FILE`; `None` keeps
    /// whatever the environment chose.
    #[must_use]
    pub fn with_session_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.session_file = path;
        }
        self
    }

    /// Absolute URL the recovery e-mail links back to.
    #[must_use]
    pub fn reset_redirect_url(&self) -> String {
        format!("{}{}", self.app_origin, AppRoute::ResetPassword.path())
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing { var })
}

fn parse_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed).map_err(|e| ConfigError::Invalid { var, reason: e.to_string() })?;
    Ok(trimmed.to_owned())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
