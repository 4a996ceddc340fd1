//! Admin-only listings

use crate::auth::api_key::AdminAuth;
use crate::error::HubError;
use crate::store::Store;
use crate::types::{ReportView, User};
use crate::workflow::{self, catalog};
use crate::HubState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// GET /api/admin/reports — Every report in the hub
pub async fn list_all_reports<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    admin: AdminAuth,
) -> Result<Json<Vec<ReportView>>, HubError> {
    let tx = hub.store.begin().await?;
    let reports = workflow::list_all_reports(tx, &admin.user).await?;
    Ok(Json(reports))
}

/// GET /api/admin/users — Every registered user
pub async fn list_users<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    admin: AdminAuth,
) -> Result<Json<Vec<User>>, HubError> {
    let tx = hub.store.begin().await?;
    let users = catalog::list_users(tx, &admin.user).await?;
    Ok(Json(users))
}
