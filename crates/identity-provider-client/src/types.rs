//! Session, identity, and auth event types.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// An authenticated identity as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Identity UUID assigned by the provider.
    pub id: String,
    /// Email address, if the identity has one.
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata set by the user or the OAuth provider
    /// (full_name, avatar_url, ...).
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    /// Provider-managed metadata (sign-in origin, providers list).
    #[serde(default)]
    pub app_metadata: serde_json::Value,
}

impl Identity {
    /// The sign-in origin recorded by the provider (`"email"`, `"google"`, ...).
    pub fn provider(&self) -> Option<&str> {
        self.app_metadata.get("provider").and_then(|v| v.as_str())
    }

    /// Display name from the OAuth provider metadata, if present.
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata
            .get("full_name")
            .or_else(|| self.user_metadata.get("name"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Avatar URL from the OAuth provider metadata, if present.
    pub fn avatar_url(&self) -> Option<&str> {
        self.user_metadata
            .get("avatar_url")
            .or_else(|| self.user_metadata.get("picture"))
            .and_then(|v| v.as_str())
    }
}

/// A time-bounded proof of authentication for one identity.
///
/// Replaced wholesale on every sign-in or refresh; cleared on sign-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Token used to obtain a fresh access token.
    pub refresh_token: String,
    /// Expiry as epoch seconds (UTC).
    pub expires_at: i64,
    /// The identity this session authenticates.
    pub user: Identity,
}

impl Session {
    /// Seconds until this session expires, relative to `now` (epoch seconds).
    /// Negative when already expired.
    pub fn remaining_secs(&self, now: i64) -> i64 {
        self.expires_at - now
    }
}

/// Auth lifecycle events emitted by the provider client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    /// Emitted once to a new subscriber describing the session held at
    /// subscription time.
    InitialSession,
    /// A sign-in completed and a session is now held.
    SignedIn,
    /// The session was cleared.
    SignedOut,
    /// The session was replaced with fresh tokens.
    TokenRefreshed,
    /// The identity's provider-side record changed.
    UserUpdated,
    /// The provider initiated a password recovery flow.
    PasswordRecovery,
}

/// A single auth state change, paired with the session after the change.
#[derive(Debug, Clone)]
pub struct AuthStateChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

/// Subscription to auth state changes.
///
/// Dropping the subscription unsubscribes; no explicit cleanup is needed.
pub struct AuthSubscription {
    pub(crate) rx: broadcast::Receiver<AuthStateChange>,
}

impl AuthSubscription {
    /// Wait for the next auth state change.
    ///
    /// Returns `None` when the event source has been dropped. A slow consumer
    /// that falls behind skips the missed events and keeps receiving.
    pub async fn next(&mut self) -> Option<AuthStateChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth subscription lagged; skipping events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl AuthSubscription {
    /// Build a subscription directly from a broadcast receiver.
    ///
    /// Intended for test doubles that stand in for the real client.
    pub fn from_receiver(rx: broadcast::Receiver<AuthStateChange>) -> Self {
        Self { rx }
    }
}
