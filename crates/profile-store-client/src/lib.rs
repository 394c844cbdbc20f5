//! REST client for the hosted profile store.
//!
//! This crate provides a client for the `profiles` table behind the
//! project's REST API:
//! - Fetch a profile row by identity id
//! - Insert a new profile row
//! - Apply partial field updates to an existing row
//!
//! One profile row exists per identity; this client never deletes rows.

mod client;
mod error;
mod types;

pub use client::ProfileStoreClient;
pub use error::{StoreError, StoreResult};
pub use types::{Profile, ProfilePatch};
