//! GasDyn Hub: well-report service for gas-dynamic well treatment
//!
//! Engineers record well measurements (depth, pressure) as reports. Each
//! report points at a de-duplicated well-state snapshot, carries derived
//! metrics, and is shared with other users through per-user permissions.
//!
//! ## Modules
//!
//! - `config`      — Hub configuration (TOML file, env vars, CLI args)
//! - `db`          — Database connection pool and migration runner
//! - `store`       — Transactional storage trait, PostgreSQL and in-memory backends
//! - `calculation` — Derived metrics from a well state
//! - `workflow`    — Report upsert, reconciliation, permissions, catalog
//! - `auth`        — Passphrase + user-id request extractors
//! - `api`         — HTTP route handlers

pub mod api;
pub mod auth;
pub mod calculation;
pub mod config;
pub mod db;
pub mod error;
pub mod store;
pub mod types;
pub mod workflow;

use std::sync::Arc;

pub use config::HubConfig;
pub use error::{HubError, HubResult};
pub use store::{MemoryStore, PgStore, Store, StoreTx};

/// Shared hub application state
pub struct HubState<S: Store> {
    /// Storage backend
    pub store: S,
    /// Hub configuration
    pub config: HubConfig,
}

impl<S: Store> HubState<S> {
    pub fn new(store: S, config: HubConfig) -> Arc<Self> {
        Arc::new(Self { store, config })
    }
}
