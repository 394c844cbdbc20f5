//! Shared mutable state behind the coordinator.
//!
//! Every field here can be touched from several tasks (the dispatcher, the
//! refresh scheduler, and direct API calls), so all of it lives behind
//! synchronization primitives and every mutation is gated on the mounted
//! flag. Once `unmount` runs, writes become no-ops.

use identity_provider_client::{Identity, Session};
use profile_store_client::Profile;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

#[derive(Debug, Default)]
struct ProfileSlot {
    profile: Option<Profile>,
    /// Identity id the held profile belongs to. Kept separate from the
    /// profile itself so "load attempted, nothing found" is distinguishable
    /// from "never loaded".
    loaded_for: Option<String>,
}

/// State shared by all coordinator tasks.
#[derive(Debug)]
pub(crate) struct SharedState {
    session: RwLock<Option<Session>>,
    profile: RwLock<ProfileSlot>,
    pub(crate) load_guard: crate::guard::InFlight,
    pub(crate) refresh_guard: crate::guard::InFlight,
    mounted: AtomicBool,
    loading: AtomicBool,
    error: Mutex<Option<String>>,
    last_processed_sign_in: Mutex<Option<String>>,
    first_sign_in: AtomicBool,
    last_hidden_at: Mutex<Option<Instant>>,
    last_blurred_at: Mutex<Option<Instant>>,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            session: RwLock::new(None),
            profile: RwLock::new(ProfileSlot::default()),
            load_guard: crate::guard::InFlight::new(),
            refresh_guard: crate::guard::InFlight::new(),
            mounted: AtomicBool::new(true),
            loading: AtomicBool::new(true),
            error: Mutex::new(None),
            last_processed_sign_in: Mutex::new(None),
            first_sign_in: AtomicBool::new(false),
            last_hidden_at: Mutex::new(None),
            last_blurred_at: Mutex::new(None),
        }
    }

    // ---- lifecycle -------------------------------------------------------

    pub(crate) fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub(crate) fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub(crate) fn finish_loading(&self) {
        self.loading.store(false, Ordering::Release);
    }

    // ---- session ---------------------------------------------------------

    pub(crate) async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub(crate) async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub(crate) async fn user(&self) -> Option<Identity> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }

    pub(crate) async fn set_session(&self, session: Session) {
        if !self.is_mounted() {
            return;
        }
        *self.session.write().await = Some(session);
    }

    /// Replace the identity inside the held session, keeping the tokens.
    pub(crate) async fn update_user(&self, user: Identity) {
        if !self.is_mounted() {
            return;
        }
        if let Some(session) = self.session.write().await.as_mut() {
            session.user = user;
        }
    }

    // ---- profile ---------------------------------------------------------

    pub(crate) async fn profile(&self) -> Option<Profile> {
        self.profile.read().await.profile.clone()
    }

    /// True when a profile for exactly this identity is already held.
    pub(crate) async fn profile_loaded_for(&self, id: &str) -> bool {
        let slot = self.profile.read().await;
        slot.profile.is_some() && slot.loaded_for.as_deref() == Some(id)
    }

    pub(crate) async fn store_profile(&self, id: &str, profile: Profile) {
        if !self.is_mounted() {
            return;
        }
        let mut slot = self.profile.write().await;
        slot.profile = Some(profile);
        slot.loaded_for = Some(id.to_string());
    }

    pub(crate) async fn clear_profile(&self) {
        if !self.is_mounted() {
            return;
        }
        *self.profile.write().await = ProfileSlot::default();
    }

    /// Clear everything tied to the signed-in identity: session, profile,
    /// and the duplicate-sign-in marker.
    pub(crate) async fn clear_identity_state(&self) {
        if !self.is_mounted() {
            return;
        }
        *self.session.write().await = None;
        *self.profile.write().await = ProfileSlot::default();
        *self.last_processed_sign_in.lock().await = None;
    }

    // ---- user-facing error -----------------------------------------------

    pub(crate) async fn set_error(&self, message: String) {
        if !self.is_mounted() {
            return;
        }
        *self.error.lock().await = Some(message);
    }

    pub(crate) async fn clear_error(&self) {
        if !self.is_mounted() {
            return;
        }
        *self.error.lock().await = None;
    }

    pub(crate) async fn error(&self) -> Option<String> {
        self.error.lock().await.clone()
    }

    // ---- sign-in dedup and first-sign-in ---------------------------------

    /// Record that a sign-in for `id` is being processed.
    ///
    /// Returns `false` when the previous processed sign-in was for the same
    /// identity, meaning this notification is a duplicate to drop.
    pub(crate) async fn mark_sign_in_processed(&self, id: &str) -> bool {
        let mut last = self.last_processed_sign_in.lock().await;
        if last.as_deref() == Some(id) {
            return false;
        }
        *last = Some(id.to_string());
        true
    }

    pub(crate) fn mark_first_sign_in(&self) {
        self.first_sign_in.store(true, Ordering::Release);
    }

    pub(crate) fn first_sign_in(&self) -> bool {
        self.first_sign_in.load(Ordering::Acquire)
    }

    // ---- staleness timestamps --------------------------------------------

    pub(crate) async fn mark_hidden(&self, at: Instant) {
        *self.last_hidden_at.lock().await = Some(at);
    }

    pub(crate) async fn take_hidden(&self) -> Option<Instant> {
        self.last_hidden_at.lock().await.take()
    }

    pub(crate) async fn mark_blurred(&self, at: Instant) {
        *self.last_blurred_at.lock().await = Some(at);
    }

    pub(crate) async fn take_blurred(&self) -> Option<Instant> {
        self.last_blurred_at.lock().await.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use identity_provider_client::Identity;

    fn session_for(id: &str) -> Session {
        Session {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: 2_000_000_000,
            user: Identity {
                id: id.to_string(),
                email: Some(format!("{id}@example.com")),
                user_metadata: serde_json::Value::Null,
                app_metadata: serde_json::Value::Null,
            },
        }
    }

    #[tokio::test]
    async fn unmounted_state_rejects_writes() {
        let state = SharedState::new();
        state.unmount();

        state.set_session(session_for("u1")).await;
        assert!(state.session().await.is_none());

        state
            .store_profile("u1", Profile {
                id: "u1".to_string(),
                name: None,
                surname: None,
                email: None,
                phone: None,
                photo_url: None,
                age: None,
                status: None,
                role: None,
            })
            .await;
        assert!(state.profile().await.is_none());

        state.set_error("boom".to_string()).await;
        assert!(state.error().await.is_none());
    }

    #[tokio::test]
    async fn profile_loaded_for_tracks_identity() {
        let state = SharedState::new();
        let profile = Profile {
            id: "u1".to_string(),
            name: Some("Ana".to_string()),
            surname: None,
            email: None,
            phone: None,
            photo_url: None,
            age: None,
            status: None,
            role: None,
        };
        state.store_profile("u1", profile).await;
        assert!(state.profile_loaded_for("u1").await);
        assert!(!state.profile_loaded_for("u2").await);

        state.clear_profile().await;
        assert!(!state.profile_loaded_for("u1").await);
    }

    #[tokio::test]
    async fn sign_in_dedup_resets_on_clear() {
        let state = SharedState::new();
        assert!(state.mark_sign_in_processed("u1").await);
        assert!(!state.mark_sign_in_processed("u1").await);
        assert!(state.mark_sign_in_processed("u2").await);

        state.clear_identity_state().await;
        assert!(state.mark_sign_in_processed("u2").await);
    }

    #[tokio::test]
    async fn update_user_keeps_tokens() {
        let state = SharedState::new();
        state.set_session(session_for("u1")).await;

        let mut updated = session_for("u1").user;
        updated.email = Some("nuevo@example.com".to_string());
        state.update_user(updated).await;

        let session = state.session().await.unwrap();
        assert_eq!(session.access_token, "at");
        assert_eq!(session.user.email.as_deref(), Some("nuevo@example.com"));
    }
}
