//! HTTP client for the hosted identity provider (Supabase GoTrue).
//!
//! This crate provides:
//! - [`AuthClient`]: REST client for sign-in (password/OAuth code exchange),
//!   sign-out, session refresh, and password recovery
//! - In-process session state: the most recent [`Session`] is stored in the
//!   client and replaced wholesale on every sign-in or refresh
//! - [`AuthSubscription`]: a typed, cancellable stream of
//!   [`AuthStateChange`] events, broadcast to every subscriber

mod client;
mod error;
mod types;

pub use client::AuthClient;
pub use error::{AuthError, AuthResult};
pub use types::{
    AuthChangeEvent, AuthStateChange, AuthSubscription, Identity, Session,
};
