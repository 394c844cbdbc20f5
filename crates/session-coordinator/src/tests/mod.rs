//! Integration tests for the coordination engine.
//!
//! Organization:
//!
//! - `fakes.rs`      - In-memory identity provider and profile store doubles
//! - `loader.rs`     - Profile load dedup and caching
//! - `refresh.rs`    - Refresh threshold, mutual exclusion, staleness triggers
//! - `bootstrap.rs`  - OAuth profile bootstrap (poll, enrich, insert)
//! - `dispatcher.rs` - Auth event handling and sign-in idempotency
//! - `coordinator.rs`- End-to-end lifecycle through the facade

mod bootstrap;
