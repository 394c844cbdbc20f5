//! Profile bootstrap after an OAuth sign-in.
//!
//! A server-side trigger creates the profile row shortly after the identity
//! is registered, but the row is not guaranteed to exist yet when the client
//! observes the sign-in. The bootstrap polls for the row; if it shows up, the
//! row is enriched with OAuth metadata without overwriting anything the user
//! already saved. If it never shows up, the client inserts it directly.

use crate::poll::{poll_until, PollSchedule};
use crate::ports::StoreHandle;
use crate::state::SharedState;
use identity_provider_client::Session;
use profile_store_client::{Profile, ProfilePatch};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_ROLE: &str = "usuario";
const DEFAULT_STATUS: &str = "activo";
const DEFAULT_NAME: &str = "Usuario";

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Split a display name into given name and family name.
///
/// The first whitespace-separated token is the given name; everything after
/// it is the family name.
fn split_display_name(full_name: &str) -> (Option<String>, Option<String>) {
    let mut parts = full_name.split_whitespace();
    let given = parts.next().map(|s| s.to_string());
    let rest = parts.collect::<Vec<_>>().join(" ");
    let family = (!rest.is_empty()).then_some(rest);
    (given, family)
}

/// Ensure a profile row exists for an OAuth identity and store it in state.
///
/// Polls for the trigger-created row first; enriches it non-destructively
/// when found, inserts a fresh row when the poll schedule is exhausted.
pub(crate) async fn bootstrap_from_oauth(
    state: &Arc<SharedState>,
    store: &StoreHandle,
    session: &Session,
    schedule: PollSchedule,
) -> Option<Profile> {
    let id = session.user.id.clone();
    let token = session.access_token.clone();

    let existing = poll_until(schedule, || {
        let store = Arc::clone(store);
        let id = id.clone();
        let token = token.clone();
        async move {
            match store.get_profile_by_id(&id, &token).await {
                Ok(row) => row,
                Err(err) => {
                    debug!(id = %id, error = %err, "Profile poll attempt failed");
                    None
                }
            }
        }
    })
    .await;

    if !state.is_mounted() {
        return None;
    }

    match existing {
        Some(row) => {
            let merged = enrich_existing(state, store, session, row).await;
            state.store_profile(&id, merged.clone()).await;
            Some(merged)
        }
        None => {
            info!(id = %id, "No trigger-created profile; inserting directly");
            let record = initial_profile(session);
            match store.insert_profile(&record, &token).await {
                Ok(inserted) => {
                    state.mark_first_sign_in();
                    state.store_profile(&id, inserted.clone()).await;
                    Some(inserted)
                }
                Err(err) => {
                    warn!(id = %id, error = %err, "Profile insert failed");
                    None
                }
            }
        }
    }
}

/// Fill the blank fields of a trigger-created row from OAuth metadata.
///
/// Only fields the row does not already have are patched; a user-edited row
/// is never overwritten. The patch is best-effort: a failed update still
/// leaves the locally merged profile usable.
async fn enrich_existing(
    state: &Arc<SharedState>,
    store: &StoreHandle,
    session: &Session,
    mut row: Profile,
) -> Profile {
    let identity = &session.user;
    let (given, family) = identity
        .full_name()
        .map(split_display_name)
        .unwrap_or((None, None));

    let mut patch = ProfilePatch::default();
    if is_blank(&row.name) {
        patch.name = given;
    }
    if is_blank(&row.surname) {
        patch.surname = family;
    }
    if is_blank(&row.email) {
        patch.email = identity.email.clone();
    }
    if is_blank(&row.photo_url) {
        patch.photo_url = identity.avatar_url().map(|s| s.to_string());
    }

    if patch.is_empty() {
        return row;
    }

    if state.is_mounted() {
        if let Err(err) = store
            .update_profile(&row.id, &patch, &session.access_token)
            .await
        {
            warn!(id = %row.id, error = %err, "Profile enrichment update failed");
        }
    }

    // Merge locally regardless; the row on the server catches up next load.
    if let Some(name) = patch.name {
        row.name = Some(name);
    }
    if let Some(surname) = patch.surname {
        row.surname = Some(surname);
    }
    if let Some(email) = patch.email {
        row.email = Some(email);
    }
    if let Some(photo_url) = patch.photo_url {
        row.photo_url = Some(photo_url);
    }
    row
}

/// Profile record for a brand-new OAuth identity.
fn initial_profile(session: &Session) -> Profile {
    let identity = &session.user;
    let (given, family) = identity
        .full_name()
        .map(split_display_name)
        .unwrap_or((None, None));

    Profile {
        id: identity.id.clone(),
        name: Some(given.unwrap_or_else(|| DEFAULT_NAME.to_string())),
        surname: family,
        email: identity.email.clone(),
        phone: None,
        photo_url: identity.avatar_url().map(|s| s.to_string()),
        age: None,
        status: Some(DEFAULT_STATUS.to_string()),
        role: Some(DEFAULT_ROLE.to_string()),
    }
}
