//! Session bootstrap: initial fetch plus the change-subscription listener.
//!
//! DESIGN
//! ======
//! `mount` opens the remote change subscription and spawns two tasks: one
//! `get_session` fetch and a listener draining change events. Both write
//! authoritative snapshots through `SessionStore::apply_session`; neither
//! is ordered against the other, the last to land wins.
//!
//! The listener task owns the [`Subscription`], so cancelling the task is
//! what releases it. `unmount` aborts both tasks and waits for them, after
//! which no further store write can happen.

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod bootstrap_test;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::AuthFailure;
use super::store::SessionStore;
use crate::identity::IdentityService;

pub struct SessionBootstrap {
    tasks: Vec<JoinHandle<()>>,
}

impl SessionBootstrap {
    /// Start syncing `store` with the remote service. Must be called from
    /// within a Tokio runtime.
    #[must_use]
    pub fn mount(identity: Arc<dyn IdentityService>, store: SessionStore) -> Self {
        let mut subscription = identity.subscribe();

        let listener_store = store.clone();
        let listener = tokio::spawn(async move {
            while let Some(change) = subscription.recv().await {
                debug!(event = ?change.event, signed_in = change.session.is_some(), "session change");
                listener_store.apply_session(change.session);
            }
            debug!("session change stream closed");
        });

        let fetch = tokio::spawn(async move {
            match identity.get_session().await {
                Ok(session) => {
                    debug!(signed_in = session.is_some(), "initial session fetched");
                    store.apply_session(session);
                }
                Err(e) => {
                    // Treat as signed out so guards stop waiting.
                    warn!(error = %e, "initial session fetch failed");
                    store.set_error(Some(AuthFailure::from(e)));
                    store.apply_session(None);
                }
            }
        });

        info!("session bootstrap mounted");
        Self { tasks: vec![fetch, listener] }
    }

    /// Stop both tasks and release the subscription.
    pub async fn unmount(mut self) {
        for task in std::mem::take(&mut self.tasks) {
            task.abort();
            // Cancelled or already finished; either way it is gone.
            let _ = task.await;
        }
        info!("session bootstrap unmounted");
    }
}

impl Drop for SessionBootstrap {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
