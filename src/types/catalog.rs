//! Catalog types: User, Location, Cluster, Well, WellState

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Users
// ============================================================================

/// A registered user. Identity is established upstream; the hub only stores
/// the email used for sharing and the admin flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

// ============================================================================
// Location → Cluster → Well
// ============================================================================

/// Field (deposit) grouping one or more clusters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
    pub name: String,
}

/// Well pad: a group of wells at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cluster {
    pub id: Uuid,
    pub name: String,
    pub location_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCluster {
    pub name: String,
    pub location_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Well {
    pub id: Uuid,
    pub name: String,
    pub cluster_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWell {
    pub name: String,
    pub cluster_id: Uuid,
}

// ============================================================================
// Well state history
// ============================================================================

/// Point-in-time measurement snapshot for a well.
///
/// Rows are immutable once written. A well's history is the set of its
/// snapshots ordered by `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WellState {
    pub id: Uuid,
    pub well_id: Uuid,
    /// Measured depth (m)
    pub depth: Option<f64>,
    /// Formation pressure (atm)
    pub pressure: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NewWellState {
    pub well_id: Uuid,
    pub depth: Option<f64>,
    pub pressure: Option<f64>,
}

/// Filter for well-state history listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WellStateQuery {
    pub well_id: Option<Uuid>,
    /// Only meaningful together with `well_id`: return the newest snapshot only.
    #[serde(default)]
    pub latest: bool,
}
