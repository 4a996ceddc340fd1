//! Health check endpoint

use crate::store::Store;
use crate::HubState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub db_connected: bool,
    pub version: String,
}

pub async fn get_health<S: Store>(State(hub): State<Arc<HubState<S>>>) -> Json<HealthResponse> {
    let db_ok = hub.store.ping().await;

    Json(HealthResponse {
        status: if db_ok {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        db_connected: db_ok,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
