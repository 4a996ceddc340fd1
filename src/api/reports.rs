//! Report handlers — apply, read, list, copy, share, revoke, delete

use crate::auth::api_key::UserAuth;
use crate::error::HubError;
use crate::store::Store;
use crate::types::{
    Ack, ApplyReport, ReportFilter, ReportView, ShareRequest, UserReportPermission,
};
use crate::workflow;
use crate::HubState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// PUT body: the report is named by the path, so no `external_id` here.
#[derive(Debug, Deserialize)]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub well_id: Uuid,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeQuery {
    pub email: String,
}

/// POST /api/reports — Create a report, or update one when `external_id` is set
pub async fn apply_report<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    auth: UserAuth,
    Json(req): Json<ApplyReport>,
) -> Result<(StatusCode, Json<ReportView>), HubError> {
    let status = if req.external_id.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let tx = hub.store.begin().await?;
    let view = workflow::apply_report(tx, &req, &auth.user, hub.config.state_tolerance).await?;
    Ok((status, Json(view)))
}

/// PUT /api/reports/:id — Update an existing report
pub async fn update_report<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    auth: UserAuth,
    Path(external_id): Path<Uuid>,
    Json(req): Json<UpdateReportRequest>,
) -> Result<Json<ReportView>, HubError> {
    let apply = ApplyReport {
        external_id: Some(external_id),
        title: req.title,
        well_id: req.well_id,
        depth: req.depth,
        pressure: req.pressure,
    };

    let tx = hub.store.begin().await?;
    let view = workflow::apply_report(tx, &apply, &auth.user, hub.config.state_tolerance).await?;
    Ok(Json(view))
}

/// GET /api/reports/:id
pub async fn get_report<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    auth: UserAuth,
    Path(external_id): Path<Uuid>,
) -> Result<Json<ReportView>, HubError> {
    let tx = hub.store.begin().await?;
    let view = workflow::get_report(tx, external_id, &auth.user).await?;
    Ok(Json(view))
}

/// GET /api/reports?search=&date_from=&date_to=
pub async fn list_reports<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    auth: UserAuth,
    Query(filter): Query<ReportFilter>,
) -> Result<Json<Vec<ReportView>>, HubError> {
    let tx = hub.store.begin().await?;
    let reports = workflow::list_reports(tx, &auth.user, &filter).await?;
    Ok(Json(reports))
}

/// POST /api/reports/:id/copy
pub async fn copy_report<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    auth: UserAuth,
    Path(external_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReportView>), HubError> {
    let tx = hub.store.begin().await?;
    let copy = workflow::copy_report(tx, external_id, &auth.user).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// POST /api/reports/:id/share — Grant another user access (owner only)
pub async fn share_report<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    auth: UserAuth,
    Path(external_id): Path<Uuid>,
    Json(req): Json<ShareRequest>,
) -> Result<(StatusCode, Json<UserReportPermission>), HubError> {
    let tx = hub.store.begin().await?;
    let permission =
        workflow::share_report(tx, external_id, &auth.user, &req.email, req.can_edit).await?;
    Ok((StatusCode::CREATED, Json(permission)))
}

/// DELETE /api/reports/:id/revoke?email= — Remove another user's access (owner only)
pub async fn revoke_access<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    auth: UserAuth,
    Path(external_id): Path<Uuid>,
    Query(query): Query<RevokeQuery>,
) -> Result<Json<Ack>, HubError> {
    let tx = hub.store.begin().await?;
    workflow::revoke_access(tx, external_id, &auth.user, &query.email).await?;
    Ok(Json(Ack::new(format!("Access revoked for {}", query.email.trim()))))
}

/// DELETE /api/reports/:id (owner only)
pub async fn delete_report<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    auth: UserAuth,
    Path(external_id): Path<Uuid>,
) -> Result<Json<Ack>, HubError> {
    let tx = hub.store.begin().await?;
    workflow::delete_report(tx, external_id, &auth.user).await?;
    Ok(Json(Ack::new("Report deleted")))
}
