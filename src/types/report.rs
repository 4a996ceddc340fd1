//! Report types: Report, ReportCalculated, UserReportPermission, and the
//! request/view shapes used by the report workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::CalculatedMetrics;

// ============================================================================
// Stored records
// ============================================================================

/// A user-facing report over one well-state snapshot.
///
/// `id` is internal; clients address reports by `external_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Report {
    pub id: Uuid,
    pub external_id: Uuid,
    pub title: Option<String>,
    pub well_state_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Derived metrics attached one-to-one to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReportCalculated {
    pub report_id: Uuid,
    pub effective_pressure: Option<f64>,
    pub required_charges: Option<i64>,
    pub gas_volume: Option<f64>,
    pub impact_duration: Option<f64>,
}

impl ReportCalculated {
    pub fn from_metrics(report_id: Uuid, metrics: CalculatedMetrics) -> Self {
        Self {
            report_id,
            effective_pressure: Some(metrics.effective_pressure),
            required_charges: Some(metrics.required_charges),
            gas_volume: Some(metrics.gas_volume),
            impact_duration: Some(metrics.impact_duration),
        }
    }
}

/// Per-user access grant on a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserReportPermission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_id: Uuid,
    pub is_owner: bool,
    pub can_edit: bool,
}

// ============================================================================
// Inserts
// ============================================================================

/// Fields supplied when inserting a report row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub external_id: Uuid,
    pub title: Option<String>,
    pub well_state_id: Uuid,
    pub created_by: Uuid,
}

impl NewReport {
    pub fn new(title: Option<String>, well_state_id: Uuid, created_by: Uuid) -> Self {
        Self {
            external_id: Uuid::new_v4(),
            title,
            well_state_id,
            created_by,
        }
    }

    /// Copy of `source` owned by `created_by` under a fresh external id.
    ///
    /// Copied fields: `title`, `well_state_id`. Identity, ownership and
    /// timestamps are never carried over.
    pub fn copied_from(source: &Report, created_by: Uuid) -> Self {
        Self::new(source.title.clone(), source.well_state_id, created_by)
    }
}

// ============================================================================
// Workflow requests and views
// ============================================================================

/// Create-or-update request for a report.
///
/// Without `external_id` a new report is created; with it, the existing
/// report is updated in place.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplyReport {
    #[serde(default)]
    pub external_id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    pub well_id: Uuid,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

/// Report as returned to clients, with its calculation inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportView {
    pub id: Uuid,
    pub external_id: Uuid,
    pub title: Option<String>,
    pub well_state_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub calculated: Option<ReportCalculated>,
}

impl ReportView {
    pub fn new(report: Report, calculated: Option<ReportCalculated>) -> Self {
        Self {
            id: report.id,
            external_id: report.external_id,
            title: report.title,
            well_state_id: report.well_state_id,
            created_by: report.created_by,
            created_at: report.created_at,
            calculated,
        }
    }
}

/// Listing filter for a user's reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilter {
    /// Case-insensitive match on location, cluster or well name.
    pub search: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Share request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareRequest {
    pub email: String,
    #[serde(default)]
    pub can_edit: bool,
}

/// Acknowledgement body for share/revoke/delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
