//! Ports to the hosted service.
//!
//! The coordinator talks to the identity provider and the profile store
//! through these traits so tests can substitute in-memory fakes for the
//! HTTP clients.

use async_trait::async_trait;
use identity_provider_client::{
    AuthClient, AuthResult, AuthSubscription, Identity, Session,
};
use profile_store_client::{Profile, ProfilePatch, ProfileStoreClient, StoreResult};
use std::sync::Arc;

/// Identity provider operations the coordinator depends on.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Session as the provider currently knows it, if any.
    async fn current_session(&self) -> Option<Session>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session>;

    /// Authorization URL to open in the user's browser. No network call.
    fn oauth_authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> String;

    async fn exchange_code_for_session(&self, code: &str) -> AuthResult<Session>;

    async fn refresh_session(&self) -> AuthResult<Session>;

    async fn get_user(&self) -> AuthResult<Identity>;

    async fn sign_out(&self) -> AuthResult<()>;

    async fn reset_password_for_email(&self, email: &str, redirect_to: Option<&str>)
        -> AuthResult<()>;

    fn subscribe(&self) -> AuthSubscription;
}

/// Profile store operations the coordinator depends on.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile_by_id(&self, id: &str, access_token: &str)
        -> StoreResult<Option<Profile>>;

    async fn insert_profile(&self, record: &Profile, access_token: &str) -> StoreResult<Profile>;

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
        access_token: &str,
    ) -> StoreResult<()>;
}

pub type ProviderHandle = Arc<dyn IdentityProvider>;
pub type StoreHandle = Arc<dyn ProfileStore>;

#[async_trait]
impl IdentityProvider for AuthClient {
    async fn current_session(&self) -> Option<Session> {
        AuthClient::current_session(self).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        AuthClient::sign_in_with_password(self, email, password).await
    }

    fn oauth_authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> String {
        AuthClient::oauth_authorize_url(self, provider, redirect_to)
    }

    async fn exchange_code_for_session(&self, code: &str) -> AuthResult<Session> {
        AuthClient::exchange_code_for_session(self, code).await
    }

    async fn refresh_session(&self) -> AuthResult<Session> {
        AuthClient::refresh_session(self).await
    }

    async fn get_user(&self) -> AuthResult<Identity> {
        AuthClient::get_user(self).await
    }

    async fn sign_out(&self) -> AuthResult<()> {
        AuthClient::sign_out(self).await
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> AuthResult<()> {
        AuthClient::reset_password_for_email(self, email, redirect_to).await
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthClient::subscribe(self)
    }
}

#[async_trait]
impl ProfileStore for ProfileStoreClient {
    async fn get_profile_by_id(
        &self,
        id: &str,
        access_token: &str,
    ) -> StoreResult<Option<Profile>> {
        ProfileStoreClient::get_profile_by_id(self, id, access_token).await
    }

    async fn insert_profile(&self, record: &Profile, access_token: &str) -> StoreResult<Profile> {
        ProfileStoreClient::insert_profile(self, record, access_token).await
    }

    async fn update_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
        access_token: &str,
    ) -> StoreResult<()> {
        ProfileStoreClient::update_profile(self, id, patch, access_token).await
    }
}
