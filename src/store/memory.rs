//! In-process store with snapshot transactions
//!
//! `begin()` clones the committed tables into the transaction; `commit()`
//! writes the working copy back. A transaction dropped or rolled back leaves
//! the committed tables untouched. Writers are serialized optimistically: a
//! writing transaction whose snapshot is older than the committed tables
//! fails its commit with `Conflict` instead of overwriting them. Read-only
//! transactions always commit. Constraint checks mirror the PostgreSQL
//! schema: unique keys raise `Conflict`, dangling references raise `NotFound`.
//!
//! Individual operations can be made to fail with [`MemoryStore::fail_on`]
//! to exercise rollback paths.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Store, StoreTx};
use crate::error::{HubError, HubResult};
use crate::types::{
    Cluster, Location, NewCluster, NewLocation, NewReport, NewUser, NewWell, Report,
    ReportCalculated, ReportFilter, User, UserReportPermission, Well, WellState, WellStateQuery,
};

/// Write operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    InsertWellState,
    InsertReport,
    UpdateReport,
    DeleteReport,
    InsertCalculated,
    DeleteCalculated,
    InsertPermission,
    DeletePermission,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<User>,
    locations: Vec<Location>,
    clusters: Vec<Cluster>,
    wells: Vec<Well>,
    well_states: Vec<WellState>,
    reports: Vec<Report>,
    calculated: Vec<ReportCalculated>,
    permissions: Vec<UserReportPermission>,
    /// Bumped on every committed write.
    version: u64,
}

#[derive(Debug, Default)]
struct Shared {
    tables: Mutex<Tables>,
    faults: Mutex<HashSet<StoreOp>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

/// Row counts of the committed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    pub users: usize,
    pub well_states: usize,
    pub reports: usize,
    pub calculated: usize,
    pub permissions: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail with a storage error.
    pub fn fail_on(&self, op: StoreOp) {
        lock(&self.shared.faults).insert(op);
    }

    pub fn clear_faults(&self) {
        lock(&self.shared.faults).clear();
    }

    /// Committed row counts.
    pub fn counts(&self) -> TableCounts {
        let t = lock(&self.shared.tables);
        TableCounts {
            users: t.users.len(),
            well_states: t.well_states.len(),
            reports: t.reports.len(),
            calculated: t.calculated.len(),
            permissions: t.permissions.len(),
        }
    }

    /// Committed permission records for a report.
    pub fn permissions_for(&self, report_id: Uuid) -> Vec<UserReportPermission> {
        lock(&self.shared.tables)
            .permissions
            .iter()
            .filter(|p| p.report_id == report_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> HubResult<MemoryTx> {
        Ok(MemoryTx {
            shared: Arc::clone(&self.shared),
            tables: lock(&self.shared.tables).clone(),
            faults: lock(&self.shared.faults).clone(),
            dirty: false,
        })
    }

    async fn ping(&self) -> bool {
        true
    }
}

/// Working copy of the tables for one transaction.
#[derive(Debug)]
pub struct MemoryTx {
    shared: Arc<Shared>,
    tables: Tables,
    faults: HashSet<StoreOp>,
    dirty: bool,
}

impl MemoryTx {
    /// Working tables, marking the transaction as a writer.
    fn written(&mut self) -> &mut Tables {
        self.dirty = true;
        &mut self.tables
    }

    fn check(&self, op: StoreOp) -> HubResult<()> {
        if self.faults.contains(&op) {
            return Err(HubError::Storage(format!("injected failure on {op:?}")));
        }
        Ok(())
    }

    fn state_location_names(&self, state_id: Uuid) -> Vec<String> {
        let t = &self.tables;
        let mut names = Vec::with_capacity(3);
        let Some(state) = t.well_states.iter().find(|s| s.id == state_id) else {
            return names;
        };
        if let Some(well) = t.wells.iter().find(|w| w.id == state.well_id) {
            names.push(well.name.to_lowercase());
            if let Some(cluster) = t.clusters.iter().find(|c| c.id == well.cluster_id) {
                names.push(cluster.name.to_lowercase());
                if let Some(location) = t.locations.iter().find(|l| l.id == cluster.location_id)
                {
                    names.push(location.name.to_lowercase());
                }
            }
        }
        names
    }
}

fn newest_first<T, F>(rows: &mut [T], key: F)
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_user(&mut self, user: &NewUser) -> HubResult<User> {
        if self.tables.users.iter().any(|u| u.email == user.email) {
            return Err(HubError::conflict("email already registered"));
        }
        let row = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        self.written().users.push(row.clone());
        Ok(row)
    }

    async fn find_user_by_id(&mut self, id: Uuid) -> HubResult<Option<User>> {
        Ok(self.tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> HubResult<Option<User>> {
        Ok(self.tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&mut self) -> HubResult<Vec<User>> {
        Ok(self.tables.users.clone())
    }

    async fn insert_location(&mut self, location: &NewLocation) -> HubResult<Location> {
        if self.tables.locations.iter().any(|l| l.name == location.name) {
            return Err(HubError::conflict("location name already exists"));
        }
        let row = Location {
            id: Uuid::new_v4(),
            name: location.name.clone(),
        };
        self.written().locations.push(row.clone());
        Ok(row)
    }

    async fn list_locations(&mut self) -> HubResult<Vec<Location>> {
        let mut rows = self.tables.locations.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_cluster(&mut self, cluster: &NewCluster) -> HubResult<Cluster> {
        if !self.tables.locations.iter().any(|l| l.id == cluster.location_id) {
            return Err(HubError::not_found("Location"));
        }
        let row = Cluster {
            id: Uuid::new_v4(),
            name: cluster.name.clone(),
            location_id: cluster.location_id,
        };
        self.written().clusters.push(row.clone());
        Ok(row)
    }

    async fn list_clusters(&mut self) -> HubResult<Vec<Cluster>> {
        let mut rows = self.tables.clusters.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_well(&mut self, well: &NewWell) -> HubResult<Well> {
        if !self.tables.clusters.iter().any(|c| c.id == well.cluster_id) {
            return Err(HubError::not_found("Cluster"));
        }
        let row = Well {
            id: Uuid::new_v4(),
            name: well.name.clone(),
            cluster_id: well.cluster_id,
        };
        self.written().wells.push(row.clone());
        Ok(row)
    }

    async fn find_well(&mut self, id: Uuid) -> HubResult<Option<Well>> {
        Ok(self.tables.wells.iter().find(|w| w.id == id).cloned())
    }

    async fn list_wells(&mut self) -> HubResult<Vec<Well>> {
        let mut rows = self.tables.wells.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_latest_well_state(&mut self, well_id: Uuid) -> HubResult<Option<WellState>> {
        // max_by_key keeps the last of equal maxima, i.e. the latest insert
        Ok(self
            .tables
            .well_states
            .iter()
            .filter(|s| s.well_id == well_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn find_well_state(&mut self, id: Uuid) -> HubResult<Option<WellState>> {
        Ok(self.tables.well_states.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_well_state(
        &mut self,
        well_id: Uuid,
        depth: Option<f64>,
        pressure: Option<f64>,
    ) -> HubResult<WellState> {
        self.check(StoreOp::InsertWellState)?;
        if !self.tables.wells.iter().any(|w| w.id == well_id) {
            return Err(HubError::not_found("Well"));
        }
        let row = WellState {
            id: Uuid::new_v4(),
            well_id,
            depth,
            pressure,
            created_at: Utc::now(),
        };
        self.written().well_states.push(row.clone());
        Ok(row)
    }

    async fn list_well_states(&mut self, query: WellStateQuery) -> HubResult<Vec<WellState>> {
        let mut rows: Vec<WellState> = match query.well_id {
            Some(well_id) => self
                .tables
                .well_states
                .iter()
                .filter(|s| s.well_id == well_id)
                .cloned()
                .collect(),
            None => self.tables.well_states.clone(),
        };
        // Reverse first so equal timestamps keep newest-insert-first after the stable sort
        rows.reverse();
        newest_first(&mut rows, |s| s.created_at);
        if query.well_id.is_some() && query.latest {
            rows.truncate(1);
        }
        Ok(rows)
    }

    async fn find_report_by_external_id(
        &mut self,
        external_id: Uuid,
    ) -> HubResult<Option<Report>> {
        Ok(self
            .tables
            .reports
            .iter()
            .find(|r| r.external_id == external_id)
            .cloned())
    }

    async fn insert_report(&mut self, report: &NewReport) -> HubResult<Report> {
        self.check(StoreOp::InsertReport)?;
        if self
            .tables
            .reports
            .iter()
            .any(|r| r.external_id == report.external_id)
        {
            return Err(HubError::conflict("external id already in use"));
        }
        if !self.tables.well_states.iter().any(|s| s.id == report.well_state_id) {
            return Err(HubError::not_found("Well state"));
        }
        if !self.tables.users.iter().any(|u| u.id == report.created_by) {
            return Err(HubError::not_found("User"));
        }
        let row = Report {
            id: Uuid::new_v4(),
            external_id: report.external_id,
            title: report.title.clone(),
            well_state_id: report.well_state_id,
            created_by: report.created_by,
            created_at: Utc::now(),
        };
        self.written().reports.push(row.clone());
        Ok(row)
    }

    async fn update_report(
        &mut self,
        id: Uuid,
        title: Option<&str>,
        well_state_id: Uuid,
    ) -> HubResult<Report> {
        self.check(StoreOp::UpdateReport)?;
        if !self.tables.well_states.iter().any(|s| s.id == well_state_id) {
            return Err(HubError::not_found("Well state"));
        }
        let report = self
            .written()
            .reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| HubError::not_found("Report"))?;
        report.title = title.map(str::to_string);
        report.well_state_id = well_state_id;
        Ok(report.clone())
    }

    async fn delete_report(&mut self, id: Uuid) -> HubResult<()> {
        self.check(StoreOp::DeleteReport)?;
        let before = self.tables.reports.len();
        self.written().reports.retain(|r| r.id != id);
        if self.tables.reports.len() == before {
            return Err(HubError::not_found("Report"));
        }
        // ON DELETE CASCADE
        self.written().calculated.retain(|c| c.report_id != id);
        self.written().permissions.retain(|p| p.report_id != id);
        Ok(())
    }

    async fn list_reports_for_user(
        &mut self,
        user_id: Uuid,
        filter: &ReportFilter,
    ) -> HubResult<Vec<Report>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let visible: HashSet<Uuid> = self
            .tables
            .permissions
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.report_id)
            .collect();

        let mut rows: Vec<Report> = self
            .tables
            .reports
            .iter()
            .filter(|r| visible.contains(&r.id))
            .filter(|r| filter.date_from.map_or(true, |from| r.created_at >= from))
            .filter(|r| filter.date_to.map_or(true, |to| r.created_at <= to))
            .filter(|r| match &search {
                Some(needle) => self
                    .state_location_names(r.well_state_id)
                    .iter()
                    .any(|name| name.contains(needle.as_str())),
                None => true,
            })
            .cloned()
            .collect();
        rows.reverse();
        newest_first(&mut rows, |r| r.created_at);
        Ok(rows)
    }

    async fn list_all_reports(&mut self) -> HubResult<Vec<Report>> {
        let mut rows = self.tables.reports.clone();
        rows.reverse();
        newest_first(&mut rows, |r| r.created_at);
        Ok(rows)
    }

    async fn find_calculated(&mut self, report_id: Uuid) -> HubResult<Option<ReportCalculated>> {
        Ok(self
            .tables
            .calculated
            .iter()
            .find(|c| c.report_id == report_id)
            .cloned())
    }

    async fn insert_calculated(&mut self, calculated: &ReportCalculated) -> HubResult<()> {
        self.check(StoreOp::InsertCalculated)?;
        if !self.tables.reports.iter().any(|r| r.id == calculated.report_id) {
            return Err(HubError::not_found("Report"));
        }
        if self
            .tables
            .calculated
            .iter()
            .any(|c| c.report_id == calculated.report_id)
        {
            return Err(HubError::conflict("report already has a calculation"));
        }
        self.written().calculated.push(calculated.clone());
        Ok(())
    }

    async fn delete_calculated(&mut self, report_id: Uuid) -> HubResult<u64> {
        self.check(StoreOp::DeleteCalculated)?;
        let before = self.tables.calculated.len();
        self.written().calculated.retain(|c| c.report_id != report_id);
        Ok((before - self.tables.calculated.len()) as u64)
    }

    async fn find_permission(
        &mut self,
        user_id: Uuid,
        report_id: Uuid,
    ) -> HubResult<Option<UserReportPermission>> {
        Ok(self
            .tables
            .permissions
            .iter()
            .find(|p| p.user_id == user_id && p.report_id == report_id)
            .cloned())
    }

    async fn find_owner_permission(
        &mut self,
        report_id: Uuid,
    ) -> HubResult<Option<UserReportPermission>> {
        Ok(self
            .tables
            .permissions
            .iter()
            .find(|p| p.report_id == report_id && p.is_owner)
            .cloned())
    }

    async fn insert_permission(
        &mut self,
        user_id: Uuid,
        report_id: Uuid,
        is_owner: bool,
        can_edit: bool,
    ) -> HubResult<UserReportPermission> {
        self.check(StoreOp::InsertPermission)?;
        if !self.tables.users.iter().any(|u| u.id == user_id) {
            return Err(HubError::not_found("User"));
        }
        if !self.tables.reports.iter().any(|r| r.id == report_id) {
            return Err(HubError::not_found("Report"));
        }
        let perms = &self.tables.permissions;
        if perms
            .iter()
            .any(|p| p.user_id == user_id && p.report_id == report_id)
        {
            return Err(HubError::conflict("permission already exists"));
        }
        if is_owner && perms.iter().any(|p| p.report_id == report_id && p.is_owner) {
            return Err(HubError::conflict("report already has an owner"));
        }
        let row = UserReportPermission {
            id: Uuid::new_v4(),
            user_id,
            report_id,
            is_owner,
            can_edit,
        };
        self.written().permissions.push(row.clone());
        Ok(row)
    }

    async fn delete_permission(&mut self, id: Uuid) -> HubResult<()> {
        self.check(StoreOp::DeletePermission)?;
        let before = self.tables.permissions.len();
        self.written().permissions.retain(|p| p.id != id);
        if self.tables.permissions.len() == before {
            return Err(HubError::not_found("Permission"));
        }
        Ok(())
    }

    async fn delete_permissions_for_report(&mut self, report_id: Uuid) -> HubResult<u64> {
        self.check(StoreOp::DeletePermission)?;
        let before = self.tables.permissions.len();
        self.written().permissions.retain(|p| p.report_id != report_id);
        Ok((before - self.tables.permissions.len()) as u64)
    }

    async fn commit(self) -> HubResult<()> {
        self.check(StoreOp::Commit)?;
        if !self.dirty {
            return Ok(());
        }

        let Self {
            shared, mut tables, ..
        } = self;
        let mut committed = lock(&shared.tables);
        if committed.version != tables.version {
            return Err(HubError::conflict(
                "store changed since the transaction began; retry",
            ));
        }
        tables.version += 1;
        *committed = tables;
        Ok(())
    }

    async fn rollback(self) -> HubResult<()> {
        Ok(())
    }
}
