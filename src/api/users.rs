//! User registration

use crate::auth::api_key::ServiceAuth;
use crate::error::HubError;
use crate::store::Store;
use crate::types::{NewUser, User};
use crate::workflow::catalog;
use crate::HubState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

/// POST /api/users — Register a user (service passphrase only)
pub async fn register_user<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    _service: ServiceAuth,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), HubError> {
    let tx = hub.store.begin().await?;
    let user = catalog::register_user(tx, &req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
