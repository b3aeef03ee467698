//! Client-side session state and its lifecycle.
//!
//! DESIGN
//! ======
//! `state` is the plain data, `store` the injectable handle every writer
//! and reader shares, `bootstrap` the long-lived sync with the remote
//! service.

pub mod bootstrap;
pub mod state;
pub mod store;
