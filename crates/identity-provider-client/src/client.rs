//! GoTrue REST client with in-process session state and event broadcast.

use crate::error::{AuthError, AuthResult};
use crate::types::{AuthChangeEvent, AuthStateChange, AuthSubscription, Identity, Session};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

/// Broadcast channel capacity for auth state change events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

struct AuthClientInner {
    http: reqwest::Client,
    base_url: String,
    publishable_key: String,
    session: RwLock<Option<Session>>,
    event_tx: broadcast::Sender<AuthStateChange>,
}

impl std::fmt::Debug for AuthClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClientInner")
            .field("base_url", &self.base_url)
            .field("publishable_key", &"***")
            .finish()
    }
}

/// Token grant response from GoTrue.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp() + self.expires_in);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// HTTP client for the identity provider's auth API (`/auth/v1/...`).
///
/// Stores the current [`Session`] in-process and broadcasts
/// [`AuthStateChange`] events to every subscriber. Clones share state.
#[derive(Debug, Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

impl AuthClient {
    /// Create a new auth client.
    ///
    /// # Arguments
    /// * `supabase_url` - The project API URL (e.g., `https://xyz.supabase.co`)
    /// * `publishable_key` - The publishable API key, sent as the `apikey` header
    pub fn new(
        supabase_url: impl Into<String>,
        publishable_key: impl Into<String>,
    ) -> AuthResult<Self> {
        let base_url = supabase_url.into().trim_end_matches('/').to_string();
        let publishable_key = publishable_key.into();

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            "apikey",
            HeaderValue::from_str(&publishable_key)
                .map_err(|e| AuthError::InvalidConfig(format!("Invalid API key header: {}", e)))?,
        );
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(AuthError::Http)?;

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(AuthClientInner {
                http,
                base_url,
                publishable_key,
                session: RwLock::new(None),
                event_tx,
            }),
        })
    }

    /// Build the auth API URL for an endpoint path.
    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.inner.base_url, path)
    }

    // ── Session state ──

    /// Get the currently stored session (no network call).
    pub async fn current_session(&self) -> Option<Session> {
        self.inner.session.read().await.clone()
    }

    /// Replace the stored session and emit `SignedIn`.
    ///
    /// Use this to restore a session from external token persistence.
    pub async fn set_session(&self, session: Session) {
        self.store_session(&session, AuthChangeEvent::SignedIn).await;
    }

    /// Subscribe to auth state changes.
    ///
    /// Every subscriber receives every event; dropping the subscription
    /// unsubscribes.
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.inner.event_tx.subscribe(),
        }
    }

    // ── Sign in ──

    /// Sign in with email and password (`/token?grant_type=password`).
    ///
    /// Stores the session and emits `SignedIn`.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AuthResult<Session> {
        let body = serde_json::json!({ "email": email, "password": password });
        let resp = self
            .inner
            .http
            .post(self.url("/token?grant_type=password"))
            .json(&body)
            .send()
            .await?;
        let session = self.handle_session_response(resp).await?;
        self.store_session(&session, AuthChangeEvent::SignedIn).await;
        Ok(session)
    }

    /// Build the OAuth authorization URL for a provider (no network call).
    ///
    /// The embedding shell opens this URL; the redirect lands back with a
    /// code for [`exchange_code_for_session`](Self::exchange_code_for_session).
    pub fn oauth_authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> String {
        let mut url = format!("{}?provider={}", self.url("/authorize"), provider);
        if let Some(redirect) = redirect_to {
            url.push_str("&redirect_to=");
            url.push_str(&urlencoding_encode(redirect));
        }
        url
    }

    /// Exchange an OAuth authorization code for a session
    /// (`/token?grant_type=pkce`).
    ///
    /// Stores the session and emits `SignedIn`.
    pub async fn exchange_code_for_session(&self, code: &str) -> AuthResult<Session> {
        let body = serde_json::json!({ "auth_code": code });
        let resp = self
            .inner
            .http
            .post(self.url("/token?grant_type=pkce"))
            .json(&body)
            .send()
            .await?;
        let session = self.handle_session_response(resp).await?;
        self.store_session(&session, AuthChangeEvent::SignedIn).await;
        Ok(session)
    }

    // ── Session maintenance ──

    /// Refresh the stored session (`/token?grant_type=refresh_token`).
    ///
    /// Stores the new session and emits `TokenRefreshed`.
    /// Returns `AuthError::NoSession` when no session is held.
    pub async fn refresh_session(&self) -> AuthResult<Session> {
        let refresh_token = {
            let guard = self.inner.session.read().await;
            guard
                .as_ref()
                .map(|s| s.refresh_token.clone())
                .ok_or(AuthError::NoSession)?
        };

        let body = serde_json::json!({ "refresh_token": refresh_token });
        let resp = self
            .inner
            .http
            .post(self.url("/token?grant_type=refresh_token"))
            .json(&body)
            .send()
            .await?;
        let session = self.handle_session_response(resp).await?;
        self.store_session(&session, AuthChangeEvent::TokenRefreshed)
            .await;
        Ok(session)
    }

    /// Fetch the provider-side user record for the stored session (`/user`).
    ///
    /// Updates the user held in the stored session and emits `UserUpdated`.
    /// Returns `AuthError::NoSession` when no session is held.
    pub async fn get_user(&self) -> AuthResult<Identity> {
        let access_token = {
            let guard = self.inner.session.read().await;
            guard
                .as_ref()
                .map(|s| s.access_token.clone())
                .ok_or(AuthError::NoSession)?
        };

        let resp = self
            .inner
            .http
            .get(self.url("/user"))
            .bearer_auth(&access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.provider_error(status.as_u16(), resp).await);
        }
        let user: Identity = resp.json().await?;

        let updated = {
            let mut guard = self.inner.session.write().await;
            if let Some(session) = guard.as_mut() {
                session.user = user.clone();
            }
            guard.clone()
        };
        let _ = self.inner.event_tx.send(AuthStateChange {
            event: AuthChangeEvent::UserUpdated,
            session: updated,
        });

        Ok(user)
    }

    // ── Sign out ──

    /// Sign out: invalidate the session server-side (`/logout`), then clear
    /// the stored session and emit `SignedOut`.
    ///
    /// The local session is cleared even when the server call fails; the
    /// tokens are discarded either way.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let access_token = {
            let guard = self.inner.session.read().await;
            guard.as_ref().map(|s| s.access_token.clone())
        };

        if let Some(token) = access_token {
            match self
                .inner
                .http
                .post(self.url("/logout"))
                .bearer_auth(&token)
                .send()
                .await
            {
                Ok(resp) if !resp.status().is_success() => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    warn!(
                        status = %status,
                        body_summary = %summarize_response_body(&body),
                        "Provider sign-out failed; clearing local session anyway"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Provider sign-out request failed; clearing local session anyway");
                }
                Ok(_) => {}
            }
        }

        self.clear_session().await;
        Ok(())
    }

    /// Clear the stored session and emit `SignedOut` (no network call).
    pub async fn clear_session(&self) {
        {
            let mut guard = self.inner.session.write().await;
            *guard = None;
        }
        let _ = self.inner.event_tx.send(AuthStateChange {
            event: AuthChangeEvent::SignedOut,
            session: None,
        });
    }

    // ── Password recovery ──

    /// Send a password reset email (`/recover`).
    pub async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> AuthResult<()> {
        let mut body = serde_json::json!({ "email": email });
        if let Some(redirect) = redirect_to {
            body["redirect_to"] = serde_json::json!(redirect);
        }

        let resp = self
            .inner
            .http
            .post(self.url("/recover"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.provider_error(status.as_u16(), resp).await);
        }
        Ok(())
    }

    // ── Internals ──

    async fn store_session(&self, session: &Session, event: AuthChangeEvent) {
        {
            let mut guard = self.inner.session.write().await;
            *guard = Some(session.clone());
        }
        debug!(user_id = %session.user.id, ?event, "Stored session");
        let _ = self.inner.event_tx.send(AuthStateChange {
            event,
            session: Some(session.clone()),
        });
    }

    async fn handle_session_response(&self, resp: reqwest::Response) -> AuthResult<Session> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.provider_error(status.as_u16(), resp).await);
        }
        let token: TokenResponse = resp.json().await?;
        Ok(token.into_session())
    }

    async fn provider_error(&self, status: u16, resp: reqwest::Response) -> AuthError {
        let body = resp.text().await.unwrap_or_default();
        debug!(
            status,
            body_summary = %summarize_response_body(&body),
            "Provider request rejected"
        );
        AuthError::Provider {
            status,
            message: parse_provider_message(&body),
        }
    }
}

/// Extract the human-readable message from a GoTrue error body.
///
/// GoTrue responses carry `error_description`, `msg`, or `message` depending
/// on the endpoint; the raw body is the last resort.
fn parse_provider_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    if body.is_empty() {
        "Request rejected by identity provider".to_string()
    } else {
        body.to_string()
    }
}

/// Percent-encode a redirect URL for a query parameter.
fn urlencoding_encode(s: &str) -> String {
    let mut result = String::new();
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => result.push(c),
            _ => {
                for byte in c.to_string().as_bytes() {
                    result.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> AuthClient {
        AuthClient::new("https://test.supabase.co/", "test-key").unwrap()
    }

    fn test_session(user_id: &str) -> Session {
        Session {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: chrono::Utc::now().timestamp() + 3600,
            user: Identity {
                id: user_id.to_string(),
                email: Some("ana@example.com".to_string()),
                user_metadata: serde_json::Value::Null,
                app_metadata: serde_json::Value::Null,
            },
        }
    }

    #[test]
    fn url_building_strips_trailing_slash() {
        let client = test_client();
        assert_eq!(
            client.url("/token?grant_type=password"),
            "https://test.supabase.co/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn oauth_authorize_url_encodes_redirect() {
        let client = test_client();
        let url = client.oauth_authorize_url("google", Some("https://vecino.app/callback"));
        assert!(url.starts_with("https://test.supabase.co/auth/v1/authorize?provider=google"));
        assert!(url.contains("redirect_to=https%3A%2F%2Fvecino.app%2Fcallback"));
    }

    #[test]
    fn oauth_authorize_url_without_redirect() {
        let client = test_client();
        let url = client.oauth_authorize_url("google", None);
        assert_eq!(
            url,
            "https://test.supabase.co/auth/v1/authorize?provider=google"
        );
    }

    #[test]
    fn token_response_prefers_wire_expires_at() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "expires_at": 1_700_000_000i64,
            "user": { "id": "u1" }
        }))
        .unwrap();
        assert_eq!(token.into_session().expires_at, 1_700_000_000);
    }

    #[test]
    fn token_response_computes_expires_at_when_absent() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "user": { "id": "u1" }
        }))
        .unwrap();
        let session = token.into_session();
        let remaining = session.remaining_secs(chrono::Utc::now().timestamp());
        assert!(remaining > 3590 && remaining <= 3600);
    }

    #[test]
    fn parse_provider_message_variants() {
        assert_eq!(
            parse_provider_message(r#"{"error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            parse_provider_message(r#"{"msg":"User not found"}"#),
            "User not found"
        );
        assert_eq!(parse_provider_message("plain text"), "plain text");
        assert_eq!(
            parse_provider_message(""),
            "Request rejected by identity provider"
        );
    }

    #[tokio::test]
    async fn current_session_initially_none() {
        let client = test_client();
        assert!(client.current_session().await.is_none());
    }

    #[tokio::test]
    async fn set_session_stores_and_emits_signed_in() {
        let client = test_client();
        let mut sub = client.subscribe();

        client.set_session(test_session("u1")).await;

        assert_eq!(client.current_session().await.unwrap().user.id, "u1");
        let change = sub.next().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedIn);
        assert_eq!(change.session.unwrap().user.id, "u1");
    }

    #[tokio::test]
    async fn refresh_without_session_is_no_session_error() {
        let client = test_client();
        let err = client.refresh_session().await.unwrap_err();
        assert!(matches!(err, AuthError::NoSession));
    }

    #[tokio::test]
    async fn get_user_without_session_is_no_session_error() {
        let client = test_client();
        let err = client.get_user().await.unwrap_err();
        assert!(matches!(err, AuthError::NoSession));
    }

    #[tokio::test]
    async fn sign_out_without_session_is_ok() {
        let client = test_client();
        let mut sub = client.subscribe();

        client.sign_out().await.unwrap();

        let change = sub.next().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedOut);
        assert!(change.session.is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_session_even_when_server_unreachable() {
        // Unroutable local port: the /logout call fails at the transport level.
        let client = AuthClient::new("http://127.0.0.1:1", "test-key").unwrap();
        client.set_session(test_session("u1")).await;
        let mut sub = client.subscribe();

        client.sign_out().await.unwrap();

        assert!(client.current_session().await.is_none());
        let change = sub.next().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedOut);
    }

    #[test]
    fn debug_masks_key() {
        let client = test_client();
        let debug = format!("{:?}", client.inner);
        assert!(!debug.contains("test-key"));
    }
}
