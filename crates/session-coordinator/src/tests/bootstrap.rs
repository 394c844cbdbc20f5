//! OAuth profile bootstrap: polling, non-destructive enrichment, insert.

use super::fakes::{oauth_identity, profile_row, session_for, FakeProfileStore};
use crate::bootstrap::bootstrap_from_oauth;
use crate::poll::PollSchedule;
use crate::ports::StoreHandle;
use crate::state::SharedState;
use profile_store_client::Profile;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn blank_row(id: &str) -> Profile {
    Profile {
        id: id.to_string(),
        name: None,
        surname: None,
        email: None,
        phone: None,
        photo_url: None,
        age: None,
        status: Some("activo".to_string()),
        role: Some("usuario".to_string()),
    }
}

#[tokio::test(start_paused = true)]
async fn inserts_when_no_row_ever_appears() {
    let store = Arc::new(FakeProfileStore::new());
    let state = Arc::new(SharedState::new());
    let session = session_for(oauth_identity("u1", Some("Ana María Torres")), 3_600);
    let handle: StoreHandle = Arc::clone(&store) as StoreHandle;

    let profile = bootstrap_from_oauth(&state, &handle, &session, PollSchedule::default())
        .await
        .unwrap();

    assert_eq!(store.fetches.load(Ordering::SeqCst), 5);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    assert_eq!(profile.name.as_deref(), Some("Ana"));
    assert_eq!(profile.surname.as_deref(), Some("María Torres"));
    assert_eq!(profile.role.as_deref(), Some("usuario"));
    assert_eq!(profile.status.as_deref(), Some("activo"));
    assert_eq!(profile.email.as_deref(), Some("u1@gmail.com"));
    assert!(state.first_sign_in());
    assert!(state.profile_loaded_for("u1").await);
}

#[tokio::test(start_paused = true)]
async fn missing_display_name_falls_back() {
    let store = Arc::new(FakeProfileStore::new());
    let state = Arc::new(SharedState::new());
    let session = session_for(oauth_identity("u1", None), 3_600);
    let handle: StoreHandle = Arc::clone(&store) as StoreHandle;

    let profile = bootstrap_from_oauth(&state, &handle, &session, PollSchedule::default())
        .await
        .unwrap();

    assert_eq!(profile.name.as_deref(), Some("Usuario"));
    assert!(profile.surname.is_none());
}

#[tokio::test(start_paused = true)]
async fn late_trigger_row_is_found_without_insert() {
    let store = Arc::new(FakeProfileStore::new());
    store.put_row_after_fetches(blank_row("u1"), 3);
    let state = Arc::new(SharedState::new());
    let session = session_for(oauth_identity("u1", Some("Ana Torres")), 3_600);
    let handle: StoreHandle = Arc::clone(&store) as StoreHandle;

    let profile = bootstrap_from_oauth(&state, &handle, &session, PollSchedule::default())
        .await
        .unwrap();

    assert_eq!(store.fetches.load(Ordering::SeqCst), 3);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    assert!(!state.first_sign_in());
    // The blank row was enriched from the OAuth metadata.
    assert_eq!(profile.name.as_deref(), Some("Ana"));
    assert_eq!(profile.surname.as_deref(), Some("Torres"));
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn user_edited_fields_are_never_overwritten() {
    let mut row = blank_row("u1");
    row.name = Some("Mari".to_string());
    row.email = Some("mari@example.com".to_string());
    let store = Arc::new(FakeProfileStore::with_row(row));
    let state = Arc::new(SharedState::new());
    let session = session_for(oauth_identity("u1", Some("Ana Torres")), 3_600);
    let handle: StoreHandle = Arc::clone(&store) as StoreHandle;

    let profile = bootstrap_from_oauth(&state, &handle, &session, PollSchedule::default())
        .await
        .unwrap();

    assert_eq!(profile.name.as_deref(), Some("Mari"));
    assert_eq!(profile.email.as_deref(), Some("mari@example.com"));
    // Blank fields were still filled in.
    assert_eq!(profile.surname.as_deref(), Some("Torres"));
    assert!(profile.photo_url.is_some());

    let stored = store.row("u1").unwrap();
    assert_eq!(stored.name.as_deref(), Some("Mari"));
}

#[tokio::test(start_paused = true)]
async fn complete_row_skips_the_update() {
    let store = Arc::new(FakeProfileStore::new());
    let mut row = profile_row("u1");
    row.photo_url = Some("https://cdn.example.com/custom.png".to_string());
    store.put_row(row);
    let state = Arc::new(SharedState::new());
    let session = session_for(oauth_identity("u1", Some("Ana Torres")), 3_600);
    let handle: StoreHandle = Arc::clone(&store) as StoreHandle;

    bootstrap_from_oauth(&state, &handle, &session, PollSchedule::default())
        .await
        .unwrap();

    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn unmounted_state_aborts_the_bootstrap() {
    let store = Arc::new(FakeProfileStore::new());
    let state = Arc::new(SharedState::new());
    state.unmount();
    let session = session_for(oauth_identity("u1", Some("Ana Torres")), 3_600);
    let handle: StoreHandle = Arc::clone(&store) as StoreHandle;

    let profile = bootstrap_from_oauth(&state, &handle, &session, PollSchedule::default()).await;

    assert!(profile.is_none());
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}
