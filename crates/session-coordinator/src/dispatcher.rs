//! Auth event dispatching.
//!
//! Consumes the provider's auth state change stream and drives the
//! corresponding state transitions: session capture, OAuth profile
//! bootstrap, profile load, and teardown on sign-out.

use crate::bootstrap::bootstrap_from_oauth;
use crate::loader::ProfileLoader;
use crate::poll::PollSchedule;
use crate::ports::StoreHandle;
use crate::state::SharedState;
use identity_provider_client::{AuthChangeEvent, AuthStateChange, AuthSubscription, Session};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
pub(crate) struct DispatcherConfig {
    /// Settle delay after a sign-in before touching the profile store.
    pub(crate) sign_in_grace: Duration,
    /// Sign-in origin that triggers the OAuth profile bootstrap.
    pub(crate) oauth_provider: String,
    /// Poll schedule for the trigger-created profile row.
    pub(crate) poll: PollSchedule,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            sign_in_grace: Duration::from_millis(500),
            oauth_provider: "google".to_string(),
            poll: PollSchedule::default(),
        }
    }
}

pub(crate) struct AuthEventDispatcher {
    pub(crate) state: Arc<SharedState>,
    pub(crate) store: StoreHandle,
    pub(crate) loader: ProfileLoader,
    pub(crate) config: DispatcherConfig,
}

impl AuthEventDispatcher {
    /// Spawn the dispatch loop. Runs until the event source closes or the
    /// task is aborted at teardown.
    pub(crate) fn spawn(self, mut subscription: AuthSubscription) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(change) = subscription.next().await {
                if !self.state.is_mounted() {
                    break;
                }
                self.handle(change).await;
            }
        })
    }

    async fn handle(&self, change: AuthStateChange) {
        debug!(event = ?change.event, "Auth state change");
        match change.event {
            // The startup path already captured the initial session.
            AuthChangeEvent::InitialSession => {}

            AuthChangeEvent::TokenRefreshed => {
                if let Some(session) = change.session {
                    self.state.set_session(session).await;
                }
            }

            AuthChangeEvent::SignedIn => {
                if let Some(session) = change.session {
                    self.handle_signed_in(session).await;
                }
            }

            AuthChangeEvent::SignedOut => {
                self.state.clear_identity_state().await;
            }

            AuthChangeEvent::UserUpdated | AuthChangeEvent::PasswordRecovery => {
                match change.session {
                    Some(session) => {
                        let id = session.user.id.clone();
                        self.state.set_session(session).await;
                        if !self.state.profile_loaded_for(&id).await {
                            self.loader.load_profile(&id).await;
                        }
                    }
                    // The provider no longer has a user; holding on to the
                    // old identity would render a signed-in surface for a
                    // signed-out session.
                    None => {
                        self.state.clear_identity_state().await;
                    }
                }
            }
        }
    }

    async fn handle_signed_in(&self, session: Session) {
        let id = session.user.id.clone();

        // Duplicate SignedIn notifications for the same identity are common
        // around tab restores; process each identity once.
        if !self.state.mark_sign_in_processed(&id).await {
            debug!(id = %id, "Duplicate sign-in notification; ignoring");
            return;
        }

        // Give the provider's side effects (trigger inserts, metadata
        // propagation) a moment to settle.
        tokio::time::sleep(self.config.sign_in_grace).await;
        if !self.state.is_mounted() {
            return;
        }

        self.state.set_session(session.clone()).await;

        if session.user.provider() == Some(self.config.oauth_provider.as_str()) {
            bootstrap_from_oauth(&self.state, &self.store, &session, self.config.poll).await;
        }

        if !self.state.profile_loaded_for(&id).await {
            self.loader.load_profile(&id).await;
        }
    }
}
