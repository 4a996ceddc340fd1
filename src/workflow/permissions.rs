//! Permission gate
//!
//! One permission record per (user, report) pair, and at most one record per
//! report marked as owner. Both rules are checked here before insert and
//! again by the store's unique constraints.

use tracing::info;
use uuid::Uuid;

use super::finish;
use crate::error::{HubError, HubResult};
use crate::store::StoreTx;
use crate::types::{Report, User, UserReportPermission};

pub async fn is_owner<T: StoreTx>(tx: &mut T, user_id: Uuid, report_id: Uuid) -> HubResult<bool> {
    Ok(tx
        .find_permission(user_id, report_id)
        .await?
        .is_some_and(|p| p.is_owner))
}

pub async fn can_edit<T: StoreTx>(tx: &mut T, user_id: Uuid, report_id: Uuid) -> HubResult<bool> {
    Ok(tx
        .find_permission(user_id, report_id)
        .await?
        .is_some_and(|p| p.can_edit))
}

/// Insert a permission record.
///
/// Fails with `Conflict` if the pair already has a record, or if an owner
/// record is requested for a report that already has an owner.
pub async fn grant<T: StoreTx>(
    tx: &mut T,
    user_id: Uuid,
    report_id: Uuid,
    is_owner: bool,
    can_edit: bool,
) -> HubResult<UserReportPermission> {
    if tx.find_permission(user_id, report_id).await?.is_some() {
        return Err(HubError::conflict("user already has access to this report"));
    }
    if is_owner && tx.find_owner_permission(report_id).await?.is_some() {
        return Err(HubError::conflict("report already has an owner"));
    }
    tx.insert_permission(user_id, report_id, is_owner, can_edit)
        .await
}

/// Remove the permission record for a pair.
pub async fn revoke<T: StoreTx>(tx: &mut T, user_id: Uuid, report_id: Uuid) -> HubResult<()> {
    let permission = tx
        .find_permission(user_id, report_id)
        .await?
        .ok_or_else(|| HubError::not_found("Permission"))?;
    tx.delete_permission(permission.id).await
}

/// Require an edit right on `report_id`.
pub(crate) async fn require_editor<T: StoreTx>(
    tx: &mut T,
    user_id: Uuid,
    report_id: Uuid,
) -> HubResult<()> {
    if can_edit(tx, user_id, report_id).await? {
        Ok(())
    } else {
        Err(HubError::forbidden("no edit rights on this report"))
    }
}

/// Resolve a report the acting user owns.
///
/// An absent report and a report owned by someone else are indistinguishable
/// to the caller: both are `Forbidden`.
pub(crate) async fn owned_report<T: StoreTx>(
    tx: &mut T,
    external_id: Uuid,
    user_id: Uuid,
) -> HubResult<Report> {
    let denied = || HubError::forbidden("not the report owner or report not found");

    let report = tx
        .find_report_by_external_id(external_id)
        .await?
        .ok_or_else(denied)?;
    if !is_owner(tx, user_id, report.id).await? {
        return Err(denied());
    }
    Ok(report)
}

async fn target_user<T: StoreTx>(tx: &mut T, email: &str) -> HubResult<User> {
    tx.find_user_by_email(email.trim())
        .await?
        .ok_or_else(|| HubError::not_found("User"))
}

async fn share_report_in<T: StoreTx>(
    tx: &mut T,
    external_id: Uuid,
    owner: &User,
    target_email: &str,
    can_edit: bool,
) -> HubResult<UserReportPermission> {
    let report = owned_report(tx, external_id, owner.id).await?;
    let target = target_user(tx, target_email).await?;
    let permission = grant(tx, target.id, report.id, false, can_edit).await?;

    info!(
        report = %external_id,
        owner = %owner.id,
        target = %target.id,
        can_edit,
        "Report shared"
    );
    Ok(permission)
}

/// Give `target_email` access to a report owned by `owner`.
pub async fn share_report<T: StoreTx>(
    mut tx: T,
    external_id: Uuid,
    owner: &User,
    target_email: &str,
    can_edit: bool,
) -> HubResult<UserReportPermission> {
    let result = share_report_in(&mut tx, external_id, owner, target_email, can_edit).await;
    finish(tx, result).await
}

async fn revoke_access_in<T: StoreTx>(
    tx: &mut T,
    external_id: Uuid,
    owner: &User,
    target_email: &str,
) -> HubResult<()> {
    let report = owned_report(tx, external_id, owner.id).await?;
    let target = target_user(tx, target_email).await?;

    if is_owner(tx, target.id, report.id).await? {
        return Err(HubError::conflict("the owner's access cannot be revoked"));
    }
    revoke(tx, target.id, report.id).await?;

    info!(report = %external_id, owner = %owner.id, target = %target.id, "Access revoked");
    Ok(())
}

/// Withdraw `target_email`'s access to a report owned by `owner`.
pub async fn revoke_access<T: StoreTx>(
    mut tx: T,
    external_id: Uuid,
    owner: &User,
    target_email: &str,
) -> HubResult<()> {
    let result = revoke_access_in(&mut tx, external_id, owner, target_email).await;
    finish(tx, result).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MemoryTx, Store};
    use crate::types::{NewCluster, NewLocation, NewReport, NewUser, NewWell};

    /// Open transaction holding two users and one report with no permissions.
    async fn tx_with_report() -> (MemoryTx, Uuid, Uuid, Uuid) {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let owner = tx
            .insert_user(&NewUser {
                email: "owner@field.example".into(),
                is_admin: false,
            })
            .await
            .unwrap();
        let reader = tx
            .insert_user(&NewUser {
                email: "reader@field.example".into(),
                is_admin: false,
            })
            .await
            .unwrap();
        let location = tx
            .insert_location(&NewLocation { name: "Urengoy".into() })
            .await
            .unwrap();
        let cluster = tx
            .insert_cluster(&NewCluster {
                name: "Pad 7".into(),
                location_id: location.id,
            })
            .await
            .unwrap();
        let well = tx
            .insert_well(&NewWell {
                name: "U-701".into(),
                cluster_id: cluster.id,
            })
            .await
            .unwrap();
        let state = tx
            .insert_well_state(well.id, Some(100.0), Some(50.0))
            .await
            .unwrap();
        let report = tx
            .insert_report(&NewReport::new(None, state.id, owner.id))
            .await
            .unwrap();
        (tx, owner.id, reader.id, report.id)
    }

    #[tokio::test]
    async fn test_revoke_missing_pair_is_not_found() {
        let (mut tx, _, reader, report) = tx_with_report().await;
        let err = revoke(&mut tx, reader, report).await.unwrap_err();
        assert!(matches!(err, HubError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_revoke_removes_existing_record() {
        let (mut tx, owner, reader, report) = tx_with_report().await;
        grant(&mut tx, owner, report, true, true).await.unwrap();
        grant(&mut tx, reader, report, false, true).await.unwrap();
        assert!(can_edit(&mut tx, reader, report).await.unwrap());

        revoke(&mut tx, reader, report).await.unwrap();

        assert!(tx.find_permission(reader, report).await.unwrap().is_none());
        assert!(!can_edit(&mut tx, reader, report).await.unwrap());
        assert!(is_owner(&mut tx, owner, report).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_owner_conflicts() {
        let (mut tx, owner, reader, report) = tx_with_report().await;
        grant(&mut tx, owner, report, true, true).await.unwrap();
        let err = grant(&mut tx, reader, report, true, true).await.unwrap_err();
        assert!(matches!(err, HubError::Conflict(_)));
    }
}
