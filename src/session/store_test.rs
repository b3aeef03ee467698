use super::*;
use crate::identity::mock::{dummy_session, dummy_user};

// =============================================================
// Initial state / reset
// =============================================================

#[test]
fn new_store_starts_loading_with_nothing() {
    let state = SessionStore::new().snapshot();
    assert!(state.user.is_none());
    assert!(state.session.is_none());
    assert!(state.loading);
    assert!(state.error.is_none());
}

#[test]
fn reset_restores_exact_initial_values() {
    let store = SessionStore::new();
    store.apply_session(Some(dummy_session("a@b.com")));
    store.set_error(Some(AuthFailure::NotAuthenticated));
    store.set_loading(false);

    store.reset();
    assert_eq!(store.snapshot(), SessionState::initial());
}

// =============================================================
// Setters
// =============================================================

#[test]
fn setters_touch_only_their_field() {
    let store = SessionStore::new();
    store.set_user(Some(dummy_user("a@b.com")));
    let state = store.snapshot();
    assert!(state.user.is_some());
    assert!(state.session.is_none());
    assert!(state.loading);

    store.set_loading(false);
    store.set_error(Some(AuthFailure::Remote("boom".into())));
    let state = store.snapshot();
    assert!(!state.loading);
    assert_eq!(state.error, Some(AuthFailure::Remote("boom".into())));
    assert!(state.user.is_some());
}

#[test]
fn last_write_wins() {
    let store = SessionStore::new();
    store.set_loading(false);
    store.set_loading(true);
    store.set_loading(false);
    assert!(!store.snapshot().loading);
}

#[test]
fn apply_session_pairs_user_and_session() {
    let store = SessionStore::new();
    store.apply_session(Some(dummy_session("a@b.com")));
    let state = store.snapshot();
    assert!(!state.loading);
    assert_eq!(state.user.as_ref().map(|u| u.id), state.session.as_ref().map(|s| s.user.id));

    store.apply_session(None);
    let state = store.snapshot();
    assert!(state.user.is_none());
    assert!(state.session.is_none());
}

#[test]
fn clones_share_state() {
    let store = SessionStore::new();
    let other = store.clone();
    other.set_loading(false);
    assert!(!store.snapshot().loading);
}

// =============================================================
// Change notification
// =============================================================

#[tokio::test]
async fn subscribers_see_writes() {
    let store = SessionStore::new();
    let mut rx = store.subscribe();
    store.set_loading(false);
    rx.changed().await.unwrap();
    assert!(!rx.borrow().loading);
}

#[tokio::test]
async fn ready_waits_for_loading_to_finish() {
    let store = SessionStore::new();
    let writer = store.clone();
    let handle = tokio::spawn(async move {
        tokio::task::yield_now().await;
        writer.apply_session(Some(dummy_session("a@b.com")));
    });

    let state = store.ready().await;
    assert!(!state.loading);
    assert!(state.is_authenticated());
    handle.await.unwrap();
}
