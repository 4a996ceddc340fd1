//! Catalog workflows: users, locations, clusters, wells and raw well states

use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use super::finish;
use crate::error::{HubError, HubResult};
use crate::store::StoreTx;
use crate::types::{
    Cluster, Location, NewCluster, NewLocation, NewUser, NewWell, NewWellState, User, Well,
    WellState, WellStateQuery,
};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
    })
}

/// Reject blank names; returns the trimmed name.
fn validate_name(kind: &str, name: &str) -> HubResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HubError::bad_request(format!("{kind} name must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub fn validate_email(email: &str) -> HubResult<String> {
    let trimmed = email.trim();
    if !email_regex().is_match(trimmed) {
        return Err(HubError::bad_request(format!("invalid email: {trimmed}")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_measurement(field: &str, value: Option<f64>) -> HubResult<()> {
    match value {
        Some(v) if !v.is_finite() => Err(HubError::bad_request(format!(
            "{field} must be a finite number"
        ))),
        _ => Ok(()),
    }
}

pub async fn register_user<T: StoreTx>(mut tx: T, user: &NewUser) -> HubResult<User> {
    let result: HubResult<User> = async {
        let new = NewUser {
            email: validate_email(&user.email)?,
            is_admin: user.is_admin,
        };
        tx.insert_user(&new).await
    }
    .await;
    let user = finish(tx, result).await?;
    info!(user = %user.id, admin = user.is_admin, "User registered");
    Ok(user)
}

pub async fn list_users<T: StoreTx>(mut tx: T, actor: &User) -> HubResult<Vec<User>> {
    let result = if actor.is_admin {
        tx.list_users().await
    } else {
        Err(HubError::forbidden("admin only"))
    };
    finish(tx, result).await
}

pub async fn create_location<T: StoreTx>(mut tx: T, location: &NewLocation) -> HubResult<Location> {
    let result: HubResult<Location> = async {
        let name = validate_name("location", &location.name)?;
        tx.insert_location(&NewLocation { name }).await
    }
    .await;
    finish(tx, result).await
}

pub async fn list_locations<T: StoreTx>(mut tx: T) -> HubResult<Vec<Location>> {
    let result = tx.list_locations().await;
    finish(tx, result).await
}

pub async fn create_cluster<T: StoreTx>(mut tx: T, cluster: &NewCluster) -> HubResult<Cluster> {
    let result: HubResult<Cluster> = async {
        let name = validate_name("cluster", &cluster.name)?;
        tx.insert_cluster(&NewCluster {
            name,
            location_id: cluster.location_id,
        })
        .await
    }
    .await;
    finish(tx, result).await
}

pub async fn list_clusters<T: StoreTx>(mut tx: T) -> HubResult<Vec<Cluster>> {
    let result = tx.list_clusters().await;
    finish(tx, result).await
}

pub async fn create_well<T: StoreTx>(mut tx: T, well: &NewWell) -> HubResult<Well> {
    let result: HubResult<Well> = async {
        let name = validate_name("well", &well.name)?;
        tx.insert_well(&NewWell {
            name,
            cluster_id: well.cluster_id,
        })
        .await
    }
    .await;
    finish(tx, result).await
}

pub async fn list_wells<T: StoreTx>(mut tx: T) -> HubResult<Vec<Well>> {
    let result = tx.list_wells().await;
    finish(tx, result).await
}

/// Append a snapshot unconditionally (no reconciliation).
pub async fn create_well_state<T: StoreTx>(mut tx: T, state: &NewWellState) -> HubResult<WellState> {
    let result: HubResult<WellState> = async {
        validate_measurement("depth", state.depth)?;
        validate_measurement("pressure", state.pressure)?;
        tx.insert_well_state(state.well_id, state.depth, state.pressure)
            .await
    }
    .await;
    finish(tx, result).await
}

pub async fn list_well_states<T: StoreTx>(mut tx: T, query: WellStateQuery) -> HubResult<Vec<WellState>> {
    let result = tx.list_well_states(query).await;
    finish(tx, result).await
}
