//! Profile materialization.

use crate::ports::StoreHandle;
use crate::state::SharedState;
use profile_store_client::Profile;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches the profile row for the signed-in identity into shared state.
///
/// Concurrency-safe: concurrent calls collapse into one fetch, and a call
/// for an identity whose profile is already held returns it without touching
/// the network.
#[derive(Clone)]
pub(crate) struct ProfileLoader {
    state: Arc<SharedState>,
    store: StoreHandle,
}

impl ProfileLoader {
    pub(crate) fn new(state: Arc<SharedState>, store: StoreHandle) -> Self {
        Self { state, store }
    }

    /// Load the profile for `id`, or return the cached one.
    ///
    /// Returns `None` when the id is empty, another load is already in
    /// flight, no access token is held, or the store has no row.
    pub(crate) async fn load_profile(&self, id: &str) -> Option<Profile> {
        if id.is_empty() {
            return None;
        }

        if self.state.profile_loaded_for(id).await {
            debug!(id = %id, "Profile already loaded; skipping fetch");
            return self.state.profile().await;
        }

        let _permit = match self.state.load_guard.try_acquire() {
            Some(permit) => permit,
            None => {
                debug!(id = %id, "Profile load already in flight; skipping");
                return None;
            }
        };

        let access_token = match self.state.access_token().await {
            Some(token) => token,
            None => {
                warn!(id = %id, "No access token; clearing profile");
                self.state.clear_profile().await;
                return None;
            }
        };

        match self.store.get_profile_by_id(id, &access_token).await {
            Ok(Some(profile)) => {
                debug!(id = %id, "Profile loaded");
                self.state.store_profile(id, profile.clone()).await;
                Some(profile)
            }
            Ok(None) => {
                debug!(id = %id, "No profile row for identity");
                self.state.clear_profile().await;
                None
            }
            Err(err) => {
                warn!(id = %id, error = %err, "Profile fetch failed");
                self.state.clear_profile().await;
                None
            }
        }
    }
}
