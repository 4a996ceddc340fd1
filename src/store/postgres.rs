//! PostgreSQL store backed by a sqlx connection pool

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{like_pattern, Store, StoreTx};
use crate::error::{HubError, HubResult};
use crate::types::{
    Cluster, Location, NewCluster, NewLocation, NewReport, NewUser, NewWell, Report,
    ReportCalculated, ReportFilter, User, UserReportPermission, Well, WellState, WellStateQuery,
};

const REPORT_COLUMNS: &str = "id, external_id, title, well_state_id, created_by, created_at";
const WELL_STATE_COLUMNS: &str = "id, well_id, depth, pressure, created_at";
const PERMISSION_COLUMNS: &str = "id, user_id, report_id, is_owner, can_edit";

/// Store over a shared PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> HubResult<PgTx> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

/// Open PostgreSQL transaction. Dropped without commit, sqlx rolls it back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_user(&mut self, user: &NewUser) -> HubResult<User> {
        let row = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, is_admin, created_at) VALUES ($1, $2, $3, $4)
             RETURNING id, email, is_admin, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(user.is_admin)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_user_by_id(&mut self, id: Uuid) -> HubResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, email, is_admin, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_user_by_email(&mut self, email: &str) -> HubResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, email, is_admin, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn list_users(&mut self) -> HubResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            "SELECT id, email, is_admin, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn insert_location(&mut self, location: &NewLocation) -> HubResult<Location> {
        let row = sqlx::query_as::<_, Location>(
            "INSERT INTO locations (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(&location.name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn list_locations(&mut self) -> HubResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, Location>("SELECT id, name FROM locations ORDER BY name")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn insert_cluster(&mut self, cluster: &NewCluster) -> HubResult<Cluster> {
        let row = sqlx::query_as::<_, Cluster>(
            "INSERT INTO clusters (id, name, location_id) VALUES ($1, $2, $3)
             RETURNING id, name, location_id",
        )
        .bind(Uuid::new_v4())
        .bind(&cluster.name)
        .bind(cluster.location_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn list_clusters(&mut self) -> HubResult<Vec<Cluster>> {
        let rows = sqlx::query_as::<_, Cluster>(
            "SELECT id, name, location_id FROM clusters ORDER BY name",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn insert_well(&mut self, well: &NewWell) -> HubResult<Well> {
        let row = sqlx::query_as::<_, Well>(
            "INSERT INTO wells (id, name, cluster_id) VALUES ($1, $2, $3)
             RETURNING id, name, cluster_id",
        )
        .bind(Uuid::new_v4())
        .bind(&well.name)
        .bind(well.cluster_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_well(&mut self, id: Uuid) -> HubResult<Option<Well>> {
        let row = sqlx::query_as::<_, Well>("SELECT id, name, cluster_id FROM wells WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn list_wells(&mut self) -> HubResult<Vec<Well>> {
        let rows = sqlx::query_as::<_, Well>("SELECT id, name, cluster_id FROM wells ORDER BY name")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn find_latest_well_state(&mut self, well_id: Uuid) -> HubResult<Option<WellState>> {
        let sql = format!(
            "SELECT {WELL_STATE_COLUMNS} FROM well_states WHERE well_id = $1
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, WellState>(&sql)
            .bind(well_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_well_state(&mut self, id: Uuid) -> HubResult<Option<WellState>> {
        let sql = format!("SELECT {WELL_STATE_COLUMNS} FROM well_states WHERE id = $1");
        let row = sqlx::query_as::<_, WellState>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_well_state(
        &mut self,
        well_id: Uuid,
        depth: Option<f64>,
        pressure: Option<f64>,
    ) -> HubResult<WellState> {
        let sql = format!(
            "INSERT INTO well_states ({WELL_STATE_COLUMNS}) VALUES ($1, $2, $3, $4, $5)
             RETURNING {WELL_STATE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, WellState>(&sql)
            .bind(Uuid::new_v4())
            .bind(well_id)
            .bind(depth)
            .bind(pressure)
            .bind(Utc::now())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn list_well_states(&mut self, query: WellStateQuery) -> HubResult<Vec<WellState>> {
        let rows = match query.well_id {
            Some(well_id) => {
                let limit = if query.latest { "LIMIT 1" } else { "" };
                let sql = format!(
                    "SELECT {WELL_STATE_COLUMNS} FROM well_states WHERE well_id = $1
                     ORDER BY created_at DESC {limit}"
                );
                sqlx::query_as::<_, WellState>(&sql)
                    .bind(well_id)
                    .fetch_all(&mut *self.tx)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {WELL_STATE_COLUMNS} FROM well_states ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, WellState>(&sql)
                    .fetch_all(&mut *self.tx)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn find_report_by_external_id(
        &mut self,
        external_id: Uuid,
    ) -> HubResult<Option<Report>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE external_id = $1");
        let row = sqlx::query_as::<_, Report>(&sql)
            .bind(external_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_report(&mut self, report: &NewReport) -> HubResult<Report> {
        let sql = format!(
            "INSERT INTO reports ({REPORT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {REPORT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Report>(&sql)
            .bind(Uuid::new_v4())
            .bind(report.external_id)
            .bind(&report.title)
            .bind(report.well_state_id)
            .bind(report.created_by)
            .bind(Utc::now())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn update_report(
        &mut self,
        id: Uuid,
        title: Option<&str>,
        well_state_id: Uuid,
    ) -> HubResult<Report> {
        let sql = format!(
            "UPDATE reports SET title = $2, well_state_id = $3 WHERE id = $1
             RETURNING {REPORT_COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .bind(title)
            .bind(well_state_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| HubError::not_found("Report"))
    }

    async fn delete_report(&mut self, id: Uuid) -> HubResult<()> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(HubError::not_found("Report"));
        }
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
            .map(like_pattern);

        let rows = sqlx::query_as::<_, Report>(
            r#"SELECT r.id, r.external_id, r.title, r.well_state_id, r.created_by, r.created_at
               FROM reports r
               JOIN user_report_permissions p ON p.report_id = r.id
               JOIN well_states ws ON ws.id = r.well_state_id
               JOIN wells w ON w.id = ws.well_id
               JOIN clusters c ON c.id = w.cluster_id
               JOIN locations l ON l.id = c.location_id
               WHERE p.user_id = $1
                 AND ($2::text IS NULL OR l.name ILIKE $2 OR c.name ILIKE $2 OR w.name ILIKE $2)
                 AND ($3::timestamptz IS NULL OR r.created_at >= $3)
                 AND ($4::timestamptz IS NULL OR r.created_at <= $4)
               ORDER BY r.created_at DESC"#,
        )
        .bind(user_id)
        .bind(search)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn list_all_reports(&mut self) -> HubResult<Vec<Report>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, Report>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn find_calculated(&mut self, report_id: Uuid) -> HubResult<Option<ReportCalculated>> {
        let row = sqlx::query_as::<_, ReportCalculated>(
            "SELECT report_id, effective_pressure, required_charges, gas_volume, impact_duration
             FROM report_calculated WHERE report_id = $1",
        )
        .bind(report_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn insert_calculated(&mut self, calculated: &ReportCalculated) -> HubResult<()> {
        sqlx::query(
            "INSERT INTO report_calculated
                (report_id, effective_pressure, required_charges, gas_volume, impact_duration)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(calculated.report_id)
        .bind(calculated.effective_pressure)
        .bind(calculated.required_charges)
        .bind(calculated.gas_volume)
        .bind(calculated.impact_duration)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_calculated(&mut self, report_id: Uuid) -> HubResult<u64> {
        let result = sqlx::query("DELETE FROM report_calculated WHERE report_id = $1")
            .bind(report_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_permission(
        &mut self,
        user_id: Uuid,
        report_id: Uuid,
    ) -> HubResult<Option<UserReportPermission>> {
        let sql = format!(
            "SELECT {PERMISSION_COLUMNS} FROM user_report_permissions
             WHERE user_id = $1 AND report_id = $2"
        );
        let row = sqlx::query_as::<_, UserReportPermission>(&sql)
            .bind(user_id)
            .bind(report_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_owner_permission(
        &mut self,
        report_id: Uuid,
    ) -> HubResult<Option<UserReportPermission>> {
        let sql = format!(
            "SELECT {PERMISSION_COLUMNS} FROM user_report_permissions
             WHERE report_id = $1 AND is_owner"
        );
        let row = sqlx::query_as::<_, UserReportPermission>(&sql)
            .bind(report_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_permission(
        &mut self,
        user_id: Uuid,
        report_id: Uuid,
        is_owner: bool,
        can_edit: bool,
    ) -> HubResult<UserReportPermission> {
        let sql = format!(
            "INSERT INTO user_report_permissions ({PERMISSION_COLUMNS})
             VALUES ($1, $2, $3, $4, $5) RETURNING {PERMISSION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserReportPermission>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(report_id)
            .bind(is_owner)
            .bind(can_edit)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn delete_permission(&mut self, id: Uuid) -> HubResult<()> {
        let result = sqlx::query("DELETE FROM user_report_permissions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(HubError::not_found("Permission"));
        }
        Ok(())
    }

    async fn delete_permissions_for_report(&mut self, report_id: Uuid) -> HubResult<u64> {
        let result = sqlx::query("DELETE FROM user_report_permissions WHERE report_id = $1")
            .bind(report_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> HubResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> HubResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
