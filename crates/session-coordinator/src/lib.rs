//! # SessionCoordinator: session and profile coordination engine
//!
//! The coordinator tracks the signed-in identity, keeps its access token
//! valid, and materializes the application profile record for that identity,
//! despite many independent concurrent triggers (visibility changes, window
//! focus, a periodic timer, and asynchronous provider callbacks).
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   events    ┌─────────────────────┐
//! │ AuthClient     │────────────▶│ AuthEventDispatcher │
//! │ (identity API) │             └──────────┬──────────┘
//! └────────────────┘                        │
//! ┌────────────────┐   signals   ┌──────────▼──────────┐   ┌───────────────┐
//! │ Environment    │────────────▶│ TokenRefreshScheduler│  │ ProfileLoader │
//! │ (vis/focus)    │             └──────────┬──────────┘   └──────┬────────┘
//! └────────────────┘                        │                     │
//!                               ┌───────────▼─────────────────────▼───┐
//!                               │        SessionCoordinator state     │
//!                               │  session · profile · guards · flags │
//!                               └─────────────────────────────────────┘
//! ```
//!
//! ## Key guarantees
//!
//! - **At most one profile fetch in flight** per process; a second request
//!   for an already-loaded identity is a no-op.
//! - **At most one refresh/verify in flight**, no matter which trigger
//!   (timer, visibility, focus) initiated it.
//! - **Idempotent sign-in processing**: duplicate provider `SignedIn`
//!   notifications for the same identity are dropped.
//! - **No writes after teardown**: every asynchronous continuation checks
//!   the mounted flag before mutating state.
//!
//! ## Example
//!
//! ```ignore
//! use session_coordinator::{SessionCoordinator, CoordinatorConfig};
//!
//! let coordinator = SessionCoordinator::new(provider, store, CoordinatorConfig::default());
//! coordinator.start().await;
//!
//! let env = coordinator.environment();
//! // The embedding shell forwards visibility/focus transitions:
//! env.signal(EnvironmentSignal::BecameHidden);
//! ```

mod bootstrap;
mod coordinator;
mod dispatcher;
mod environment;
mod error;
mod guard;
mod loader;
mod poll;
mod ports;
mod refresh;
mod state;

#[cfg(test)]
mod tests;

pub use coordinator::{CoordinatorConfig, SessionCoordinator};
pub use environment::{AlwaysConfirm, ConfirmPolicy, EnvironmentHandle, EnvironmentSignal};
pub use error::{CoordinatorError, CoordinatorResult};
pub use guard::{InFlight, InFlightPermit};
pub use poll::{poll_until, PollSchedule};
pub use ports::{IdentityProvider, ProfileStore, ProviderHandle, StoreHandle};
pub use refresh::RefreshConfig;
