//! Passphrase authentication extractors

use crate::error::HubError;
use crate::store::{Store, StoreTx};
use crate::types::User;
use crate::HubState;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller presented the service passphrase; no user identity required.
pub struct ServiceAuth;

/// Authenticated user (passphrase verified + `X-User-ID` resolved).
pub struct UserAuth {
    pub user: User,
}

/// Authenticated user with the admin flag set.
pub struct AdminAuth {
    pub user: User,
}

/// Extract Bearer token from Authorization header.
fn extract_bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn check_passphrase<S: Store>(parts: &Parts, state: &HubState<S>) -> Result<(), HubError> {
    let token = extract_bearer(parts)
        .ok_or_else(|| HubError::Unauthorized("Missing Bearer token".to_string()))?;

    if token == state.config.passphrase {
        Ok(())
    } else {
        Err(HubError::forbidden("Invalid passphrase"))
    }
}

async fn resolve_user<S: Store>(parts: &Parts, state: &HubState<S>) -> Result<User, HubError> {
    check_passphrase(parts, state)?;

    let raw = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| HubError::bad_request("Missing X-User-ID header"))?;
    let user_id = Uuid::parse_str(raw.trim())
        .map_err(|_| HubError::bad_request("X-User-ID is not a valid UUID"))?;

    let mut tx = state.store.begin().await?;
    let user = tx.find_user_by_id(user_id).await;
    tx.rollback().await?;

    user?.ok_or_else(|| HubError::Unauthorized("Unknown user".to_string()))
}

#[async_trait]
impl<S: Store> FromRequestParts<Arc<HubState<S>>> for ServiceAuth {
    type Rejection = HubError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<HubState<S>>,
    ) -> Result<Self, Self::Rejection> {
        check_passphrase(parts, state)?;
        Ok(Self)
    }
}

#[async_trait]
impl<S: Store> FromRequestParts<Arc<HubState<S>>> for UserAuth {
    type Rejection = HubError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<HubState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        Ok(Self { user })
    }
}

#[async_trait]
impl<S: Store> FromRequestParts<Arc<HubState<S>>> for AdminAuth {
    type Rejection = HubError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<HubState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        if user.is_admin {
            Ok(Self { user })
        } else {
            Err(HubError::forbidden("Admin rights required"))
        }
    }
}
