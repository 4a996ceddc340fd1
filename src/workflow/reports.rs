//! Report upsert workflow and report reads
//!
//! `apply_report` is the central write path:
//!
//! 1. Validate the measurement and resolve the well (and, when updating, the report and the caller's edit right)
//! 2. Reconcile the measurement into a well-state snapshot
//! 3. Insert the report with an owner record, or update it and drop its old calculation
//! 4. Compute and attach a fresh calculation
//!
//! All four steps share one transaction.

use tracing::info;
use uuid::Uuid;

use super::catalog::validate_measurement;
use super::permissions::{self, owned_report, require_editor};
use super::{finish, reconcile};
use crate::calculation::calculate_from_well_state;
use crate::error::{HubError, HubResult};
use crate::store::StoreTx;
use crate::types::{
    ApplyReport, NewReport, Report, ReportCalculated, ReportFilter, ReportView, User, WellState,
};

/// Compute and insert the calculation for `report` from `state`.
async fn attach_calculation<T: StoreTx>(
    tx: &mut T,
    report: &Report,
    state: &WellState,
) -> HubResult<ReportCalculated> {
    let calculated = ReportCalculated::from_metrics(report.id, calculate_from_well_state(state));
    tx.insert_calculated(&calculated).await?;
    Ok(calculated)
}

async fn view<T: StoreTx>(tx: &mut T, report: Report) -> HubResult<ReportView> {
    let calculated = tx.find_calculated(report.id).await?;
    Ok(ReportView::new(report, calculated))
}

async fn apply_report_in<T: StoreTx>(
    tx: &mut T,
    request: &ApplyReport,
    actor: &User,
    tolerance: f64,
) -> HubResult<ReportView> {
    validate_measurement("depth", request.depth)?;
    validate_measurement("pressure", request.pressure)?;

    if tx.find_well(request.well_id).await?.is_none() {
        return Err(HubError::not_found("Well"));
    }

    let existing = match request.external_id {
        Some(external_id) => {
            let report = tx
                .find_report_by_external_id(external_id)
                .await?
                .ok_or_else(|| HubError::not_found("Report"))?;
            require_editor(tx, actor.id, report.id).await?;
            Some(report)
        }
        None => None,
    };

    let decision = reconcile(
        tx,
        request.well_id,
        request.depth,
        request.pressure,
        tolerance,
    )
    .await?;

    let report = match existing {
        None => {
            let new = NewReport::new(request.title.clone(), decision.state_id(), actor.id);
            let report = tx.insert_report(&new).await?;
            permissions::grant(tx, actor.id, report.id, true, true).await?;
            report
        }
        Some(report) => {
            let updated = tx
                .update_report(report.id, request.title.as_deref(), decision.state_id())
                .await?;
            tx.delete_calculated(report.id).await?;
            updated
        }
    };

    let calculated = attach_calculation(tx, &report, &decision.state).await?;

    info!(
        report = %report.external_id,
        user = %actor.id,
        state = %decision.state_id(),
        new_state = decision.created,
        updated = request.external_id.is_some(),
        "Report applied"
    );

    Ok(ReportView::new(report, Some(calculated)))
}

/// Create a report, or update the one named by `request.external_id`.
pub async fn apply_report<T: StoreTx>(
    mut tx: T,
    request: &ApplyReport,
    actor: &User,
    tolerance: f64,
) -> HubResult<ReportView> {
    let result = apply_report_in(&mut tx, request, actor, tolerance).await;
    finish(tx, result).await
}

async fn get_report_in<T: StoreTx>(
    tx: &mut T,
    external_id: Uuid,
    actor: &User,
) -> HubResult<ReportView> {
    let report = tx
        .find_report_by_external_id(external_id)
        .await?
        .ok_or_else(|| HubError::not_found("Report"))?;

    if !actor.is_admin && tx.find_permission(actor.id, report.id).await?.is_none() {
        return Err(HubError::not_found("Report"));
    }
    view(tx, report).await
}

/// Fetch a report the actor has any permission on (admins see all).
pub async fn get_report<T: StoreTx>(
    mut tx: T,
    external_id: Uuid,
    actor: &User,
) -> HubResult<ReportView> {
    let result = get_report_in(&mut tx, external_id, actor).await;
    finish(tx, result).await
}

async fn list_reports_in<T: StoreTx>(
    tx: &mut T,
    actor: &User,
    filter: &ReportFilter,
) -> HubResult<Vec<ReportView>> {
    if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
        if from > to {
            return Err(HubError::bad_request("date_from is after date_to"));
        }
    }

    let reports = tx.list_reports_for_user(actor.id, filter).await?;
    let mut views = Vec::with_capacity(reports.len());
    for report in reports {
        views.push(view(tx, report).await?);
    }
    Ok(views)
}

/// Reports the actor holds a permission on, newest first.
pub async fn list_reports<T: StoreTx>(
    mut tx: T,
    actor: &User,
    filter: &ReportFilter,
) -> HubResult<Vec<ReportView>> {
    let result = list_reports_in(&mut tx, actor, filter).await;
    finish(tx, result).await
}

async fn list_all_reports_in<T: StoreTx>(tx: &mut T, actor: &User) -> HubResult<Vec<ReportView>> {
    if !actor.is_admin {
        return Err(HubError::forbidden("admin only"));
    }
    let reports = tx.list_all_reports().await?;
    let mut views = Vec::with_capacity(reports.len());
    for report in reports {
        views.push(view(tx, report).await?);
    }
    Ok(views)
}

/// Every report in the store. Admins only.
pub async fn list_all_reports<T: StoreTx>(mut tx: T, actor: &User) -> HubResult<Vec<ReportView>> {
    let result = list_all_reports_in(&mut tx, actor).await;
    finish(tx, result).await
}

async fn copy_report_in<T: StoreTx>(
    tx: &mut T,
    external_id: Uuid,
    actor: &User,
) -> HubResult<ReportView> {
    let source = tx
        .find_report_by_external_id(external_id)
        .await?
        .ok_or_else(|| HubError::not_found("Report"))?;
    if tx.find_permission(actor.id, source.id).await?.is_none() {
        return Err(HubError::not_found("Report"));
    }

    let state = tx
        .find_well_state(source.well_state_id)
        .await?
        .ok_or_else(|| HubError::not_found("Well state"))?;

    let copy = tx
        .insert_report(&NewReport::copied_from(&source, actor.id))
        .await?;
    permissions::grant(tx, actor.id, copy.id, true, true).await?;
    let calculated = attach_calculation(tx, &copy, &state).await?;

    info!(
        source = %source.external_id,
        copy = %copy.external_id,
        user = %actor.id,
        "Report copied"
    );
    Ok(ReportView::new(copy, Some(calculated)))
}

/// Duplicate a report the actor can see into a new report the actor owns.
pub async fn copy_report<T: StoreTx>(
    mut tx: T,
    external_id: Uuid,
    actor: &User,
) -> HubResult<ReportView> {
    let result = copy_report_in(&mut tx, external_id, actor).await;
    finish(tx, result).await
}

async fn delete_report_in<T: StoreTx>(
    tx: &mut T,
    external_id: Uuid,
    actor: &User,
) -> HubResult<()> {
    let report = owned_report(tx, external_id, actor.id).await?;

    tx.delete_calculated(report.id).await?;
    let revoked = tx.delete_permissions_for_report(report.id).await?;
    tx.delete_report(report.id).await?;

    info!(
        report = %external_id,
        user = %actor.id,
        permissions_removed = revoked,
        "Report deleted"
    );
    Ok(())
}

/// Delete a report owned by the actor, with its calculation and permissions.
/// Well states are kept.
pub async fn delete_report<T: StoreTx>(mut tx: T, external_id: Uuid, actor: &User) -> HubResult<()> {
    let result = delete_report_in(&mut tx, external_id, actor).await;
    finish(tx, result).await
}
