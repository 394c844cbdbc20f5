//! The coordinator facade.

use crate::dispatcher::{AuthEventDispatcher, DispatcherConfig};
use client_config_and_utils::Config;
use identity_provider_client::AuthClient;
use profile_store_client::ProfileStoreClient;
use crate::environment::{
    environment_channel, AlwaysConfirm, ConfirmPolicy, EnvironmentHandle, EnvironmentSignal,
};
use crate::error::CoordinatorResult;
use crate::loader::ProfileLoader;
use crate::poll::PollSchedule;
use crate::ports::{ProviderHandle, StoreHandle};
use crate::refresh::{self, RefreshConfig, TokenRefreshScheduler};
use crate::state::SharedState;
use identity_provider_client::{Identity, Session};
use profile_store_client::Profile;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

const LOGOUT_PROMPT: &str = "¿Cerrar sesión?";

/// Tunables for the coordinator and its background tasks.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub refresh: RefreshConfig,
    /// Settle delay after a sign-in before touching the profile store.
    pub sign_in_grace: Duration,
    /// Poll schedule for the OAuth profile bootstrap.
    pub bootstrap_poll: PollSchedule,
    /// Sign-in origin that triggers the OAuth profile bootstrap.
    pub oauth_provider: String,
    /// Redirect target for the OAuth authorize URL.
    pub oauth_redirect: Option<String>,
    /// Redirect target for the password reset email link.
    pub reset_redirect: Option<String>,
    /// Capacity of the environment signal queue.
    pub environment_queue: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            refresh: RefreshConfig::default(),
            sign_in_grace: Duration::from_millis(500),
            bootstrap_poll: PollSchedule::default(),
            oauth_provider: "google".to_string(),
            oauth_redirect: None,
            reset_redirect: None,
            environment_queue: 16,
        }
    }
}

/// Owns the session, the profile, and the background tasks that keep both
/// fresh. One instance per signed-in surface.
pub struct SessionCoordinator {
    state: Arc<SharedState>,
    provider: ProviderHandle,
    loader: ProfileLoader,
    config: CoordinatorConfig,
    store: StoreHandle,
    confirm: Arc<dyn ConfirmPolicy>,
    environment: EnvironmentHandle,
    environment_rx: Mutex<Option<mpsc::Receiver<EnvironmentSignal>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionCoordinator {
    pub fn new(provider: ProviderHandle, store: StoreHandle, config: CoordinatorConfig) -> Self {
        Self::with_confirm_policy(provider, store, config, Arc::new(AlwaysConfirm))
    }

    /// Build a coordinator wired to the hosted service described by `config`,
    /// with default tunables.
    pub fn from_config(config: &Config) -> CoordinatorResult<Self> {
        let provider = AuthClient::new(&config.supabase_url, &config.supabase_publishable_key)?;
        let store =
            ProfileStoreClient::new(&config.supabase_url, &config.supabase_publishable_key);
        Ok(Self::new(
            Arc::new(provider),
            Arc::new(store),
            CoordinatorConfig::default(),
        ))
    }

    /// Like [`SessionCoordinator::new`], with an injected confirmation policy
    /// for shells that show a real dialog before logout.
    pub fn with_confirm_policy(
        provider: ProviderHandle,
        store: StoreHandle,
        config: CoordinatorConfig,
        confirm: Arc<dyn ConfirmPolicy>,
    ) -> Self {
        let state = Arc::new(SharedState::new());
        let loader = ProfileLoader::new(Arc::clone(&state), Arc::clone(&store));
        let (environment, environment_rx) = environment_channel(config.environment_queue);
        Self {
            state,
            provider,
            loader,
            config,
            store,
            confirm,
            environment,
            environment_rx: Mutex::new(Some(environment_rx)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Handle for the embedding shell to report visibility and focus
    /// transitions. Cheap to clone.
    pub fn environment(&self) -> EnvironmentHandle {
        self.environment.clone()
    }

    /// Capture any existing session, load its profile, and start the
    /// background tasks. Call once; `loading` turns false when the initial
    /// pass completes, whether or not a session was found.
    pub async fn start(&self) {
        if let Some(session) = self.provider.current_session().await {
            let id = session.user.id.clone();
            info!(user_id = %id, "Restoring existing session");
            self.state.set_session(session).await;
            self.loader.load_profile(&id).await;
        }
        self.state.finish_loading();

        let dispatcher = AuthEventDispatcher {
            state: Arc::clone(&self.state),
            store: Arc::clone(&self.store),
            loader: self.loader.clone(),
            config: DispatcherConfig {
                sign_in_grace: self.config.sign_in_grace,
                oauth_provider: self.config.oauth_provider.clone(),
                poll: self.config.bootstrap_poll,
            },
        };
        let dispatch_task = dispatcher.spawn(self.provider.subscribe());

        let mut tasks = self.tasks.lock().await;
        tasks.push(dispatch_task);

        if let Some(signals) = self.environment_rx.lock().await.take() {
            let scheduler = TokenRefreshScheduler {
                config: self.config.refresh,
                state: Arc::clone(&self.state),
                provider: Arc::clone(&self.provider),
            };
            tasks.push(scheduler.spawn(signals));
        }
    }

    // ---- read accessors --------------------------------------------------

    pub async fn session(&self) -> Option<Session> {
        self.state.session().await
    }

    pub async fn user(&self) -> Option<Identity> {
        self.state.user().await
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.state.profile().await
    }

    /// True until the initial session restore pass completes.
    pub fn loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Last user-facing error message, if an operation failed.
    pub async fn error(&self) -> Option<String> {
        self.state.error().await
    }

    /// True when this run inserted the profile row itself (a brand-new
    /// identity the server trigger missed).
    pub fn first_sign_in(&self) -> bool {
        self.state.first_sign_in()
    }

    // ---- operations ------------------------------------------------------

    /// Sign in with email and password.
    ///
    /// The session lands through the provider's `SignedIn` event, which the
    /// dispatcher processes; callers should watch `session()` rather than
    /// expect it set on return.
    pub async fn login(&self, email: &str, password: &str) -> CoordinatorResult<Session> {
        self.state.clear_error().await;
        match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => Ok(session),
            Err(err) => {
                self.state.set_error(err.user_message()).await;
                Err(err.into())
            }
        }
    }

    /// Authorization URL to open in the user's browser for an OAuth sign-in.
    pub fn login_with_oauth(&self) -> String {
        self.provider.oauth_authorize_url(
            &self.config.oauth_provider,
            self.config.oauth_redirect.as_deref(),
        )
    }

    /// Complete an OAuth sign-in with the code from the redirect.
    pub async fn complete_oauth(&self, code: &str) -> CoordinatorResult<Session> {
        self.state.clear_error().await;
        match self.provider.exchange_code_for_session(code).await {
            Ok(session) => Ok(session),
            Err(err) => {
                self.state.set_error(err.user_message()).await;
                Err(err.into())
            }
        }
    }

    /// Send a password reset email.
    ///
    /// A previously surfaced login error stays visible; only a fresh login
    /// attempt clears it.
    pub async fn reset_password(&self, email: &str) -> CoordinatorResult<()> {
        match self
            .provider
            .reset_password_for_email(email, self.config.reset_redirect.as_deref())
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => {
                self.state.set_error(err.user_message()).await;
                Err(err.into())
            }
        }
    }

    /// Load the profile for `id`, or return the cached one. Deduplicates
    /// concurrent calls.
    pub async fn load_profile(&self, id: &str) -> Option<Profile> {
        self.loader.load_profile(id).await
    }

    /// Verify the held session now, refreshing it if it is close to expiry.
    ///
    /// Returns `true` when a valid session is held afterwards.
    pub async fn verify_and_renew_session(&self) -> bool {
        refresh::verify_and_renew(&self.config.refresh, &self.state, &self.provider).await
    }

    /// Sign out unconditionally: best-effort provider sign-out, then clear
    /// all local identity state.
    pub async fn sign_out(&self) {
        refresh::force_sign_out(&self.state, &self.provider).await;
    }

    /// Sign out behind the confirmation policy. Returns `true` when the
    /// sign-out actually happened.
    pub async fn logout(&self) -> bool {
        if !self.confirm.confirm(LOGOUT_PROMPT) {
            return false;
        }
        self.sign_out().await;
        true
    }

    /// Stop the background tasks and block all further state writes.
    /// Idempotent.
    pub async fn shutdown(&self) {
        self.state.unmount();
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.state.unmount();
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
