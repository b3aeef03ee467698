//! # authshell
//!
//! Client-side session lifecycle for an application shell whose identity
//! storage and verification live in a hosted, Supabase-compatible backend.
//!
//! DESIGN
//! ======
//! - `session::store` owns the mutable session state. It is an injected
//!   handle, never a global.
//! - `gateway` brackets every remote auth call with the loading flag and
//!   turns failures into stored errors plus notifications.
//! - `session::bootstrap` fetches the persisted session once and keeps the
//!   store in sync with remote change events until unmounted.
//! - `guard` decides whether a protected route renders, waits, or
//!   redirects to `/login`.
//! - `identity` is the seam to the remote service; `identity::supabase`
//!   is the HTTP implementation.

pub mod config;
pub mod gateway;
pub mod guard;
pub mod identity;
pub mod notify;
pub mod routes;
pub mod session;
pub mod validate;

pub use config::{AuthConfig, ConfigError};
pub use gateway::AuthGateway;
pub use guard::{GuardOutcome, GuardView, RouteGuard};
pub use identity::{IdentityError, IdentityService, Subscription};
pub use notify::{ChannelNotifier, Notification, NotificationKind, Notifier, TracingNotifier};
pub use session::bootstrap::SessionBootstrap;
pub use session::state::{AuthFailure, SessionState};
pub use session::store::SessionStore;
