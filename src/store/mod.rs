//! Persistence collaborator
//!
//! Workflows never touch a connection pool directly. They receive a
//! transaction handle ([`StoreTx`]) obtained from a [`Store`], run every
//! read and write through it, and finish it with exactly one `commit` or
//! `rollback`.
//!
//! ## Backends
//!
//! - [`PgStore`]     — PostgreSQL via sqlx (production)
//! - [`MemoryStore`] — in-process tables with snapshot transactions (tests,
//!   `--in-memory` local runs)

mod memory;
mod postgres;

pub use memory::{MemoryStore, MemoryTx, StoreOp, TableCounts};
pub use postgres::{PgStore, PgTx};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::HubResult;
use crate::types::{
    Cluster, Location, NewCluster, NewLocation, NewReport, NewUser, NewWell, Report,
    ReportCalculated, ReportFilter, User, UserReportPermission, Well, WellState, WellStateQuery,
};

/// Source of transactions.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: StoreTx + 'static;

    /// Open a new transaction.
    async fn begin(&self) -> HubResult<Self::Tx>;

    /// Whether the backend is reachable.
    async fn ping(&self) -> bool;
}

/// One open transaction against the store.
///
/// Nothing written through a handle is visible to other transactions until
/// [`StoreTx::commit`]. Dropping a handle without committing discards its
/// writes.
#[async_trait]
pub trait StoreTx: Send {
    // ── Users ───────────────────────────────────────────────────────────────
    async fn insert_user(&mut self, user: &NewUser) -> HubResult<User>;
    async fn find_user_by_id(&mut self, id: Uuid) -> HubResult<Option<User>>;
    async fn find_user_by_email(&mut self, email: &str) -> HubResult<Option<User>>;
    async fn list_users(&mut self) -> HubResult<Vec<User>>;

    // ── Catalog ─────────────────────────────────────────────────────────────
    async fn insert_location(&mut self, location: &NewLocation) -> HubResult<Location>;
    async fn list_locations(&mut self) -> HubResult<Vec<Location>>;
    async fn insert_cluster(&mut self, cluster: &NewCluster) -> HubResult<Cluster>;
    async fn list_clusters(&mut self) -> HubResult<Vec<Cluster>>;
    async fn insert_well(&mut self, well: &NewWell) -> HubResult<Well>;
    async fn find_well(&mut self, id: Uuid) -> HubResult<Option<Well>>;
    async fn list_wells(&mut self) -> HubResult<Vec<Well>>;

    // ── Well states ─────────────────────────────────────────────────────────
    /// Newest snapshot for a well by creation time.
    async fn find_latest_well_state(&mut self, well_id: Uuid) -> HubResult<Option<WellState>>;
    async fn find_well_state(&mut self, id: Uuid) -> HubResult<Option<WellState>>;
    async fn insert_well_state(
        &mut self,
        well_id: Uuid,
        depth: Option<f64>,
        pressure: Option<f64>,
    ) -> HubResult<WellState>;
    async fn list_well_states(&mut self, query: WellStateQuery) -> HubResult<Vec<WellState>>;

    // ── Reports ─────────────────────────────────────────────────────────────
    async fn find_report_by_external_id(&mut self, external_id: Uuid)
        -> HubResult<Option<Report>>;
    async fn insert_report(&mut self, report: &NewReport) -> HubResult<Report>;
    async fn update_report(
        &mut self,
        id: Uuid,
        title: Option<&str>,
        well_state_id: Uuid,
    ) -> HubResult<Report>;
    async fn delete_report(&mut self, id: Uuid) -> HubResult<()>;
    /// Reports on which `user_id` holds any permission record.
    async fn list_reports_for_user(
        &mut self,
        user_id: Uuid,
        filter: &ReportFilter,
    ) -> HubResult<Vec<Report>>;
    async fn list_all_reports(&mut self) -> HubResult<Vec<Report>>;

    // ── Derived calculation ─────────────────────────────────────────────────
    async fn find_calculated(&mut self, report_id: Uuid) -> HubResult<Option<ReportCalculated>>;
    async fn insert_calculated(&mut self, calculated: &ReportCalculated) -> HubResult<()>;
    /// Returns the number of rows removed (0 or 1).
    async fn delete_calculated(&mut self, report_id: Uuid) -> HubResult<u64>;

    // ── Permissions ─────────────────────────────────────────────────────────
    async fn find_permission(
        &mut self,
        user_id: Uuid,
        report_id: Uuid,
    ) -> HubResult<Option<UserReportPermission>>;
    async fn find_owner_permission(
        &mut self,
        report_id: Uuid,
    ) -> HubResult<Option<UserReportPermission>>;
    async fn insert_permission(
        &mut self,
        user_id: Uuid,
        report_id: Uuid,
        is_owner: bool,
        can_edit: bool,
    ) -> HubResult<UserReportPermission>;
    async fn delete_permission(&mut self, id: Uuid) -> HubResult<()>;
    async fn delete_permissions_for_report(&mut self, report_id: Uuid) -> HubResult<u64>;

    // ── Transaction boundary ────────────────────────────────────────────────
    async fn commit(self) -> HubResult<()>;
    async fn rollback(self) -> HubResult<()>;
}

/// Escape LIKE wildcards so user search text matches literally.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Samotlor"), "%Samotlor%");
        assert_eq!(like_pattern("50%_a"), "%50\\%\\_a%");
    }
}
