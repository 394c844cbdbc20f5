//! Shared configuration, paths, errors, and logging for the Vecino client runtime.
//!
//! The coordinator and the embedding shell depend on this crate for:
//! - [`Config`]: provider URL/key and log level, loaded from `~/.vecino/config.json`
//! - [`Paths`]: file system locations for runtime files
//! - [`CoreError`] / [`CoreResult`]: the base error type
//! - [`init_logging`]: tracing initialization

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_LOG_LEVEL, DEFAULT_SUPABASE_PUBLISHABLE_KEY, DEFAULT_SUPABASE_URL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
