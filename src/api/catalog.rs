//! Catalog handlers — locations, clusters, wells, well states

use crate::auth::api_key::UserAuth;
use crate::error::HubError;
use crate::store::Store;
use crate::types::{
    Cluster, Location, NewCluster, NewLocation, NewWell, NewWellState, Well, WellState,
    WellStateQuery,
};
use crate::workflow::catalog;
use crate::HubState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

/// GET /api/locations
pub async fn list_locations<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    _auth: UserAuth,
) -> Result<Json<Vec<Location>>, HubError> {
    let tx = hub.store.begin().await?;
    Ok(Json(catalog::list_locations(tx).await?))
}

/// POST /api/locations
pub async fn create_location<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    _auth: UserAuth,
    Json(req): Json<NewLocation>,
) -> Result<(StatusCode, Json<Location>), HubError> {
    let tx = hub.store.begin().await?;
    let location = catalog::create_location(tx, &req).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// GET /api/clusters
pub async fn list_clusters<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    _auth: UserAuth,
) -> Result<Json<Vec<Cluster>>, HubError> {
    let tx = hub.store.begin().await?;
    Ok(Json(catalog::list_clusters(tx).await?))
}

/// POST /api/clusters
pub async fn create_cluster<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    _auth: UserAuth,
    Json(req): Json<NewCluster>,
) -> Result<(StatusCode, Json<Cluster>), HubError> {
    let tx = hub.store.begin().await?;
    let cluster = catalog::create_cluster(tx, &req).await?;
    Ok((StatusCode::CREATED, Json(cluster)))
}

/// GET /api/wells
pub async fn list_wells<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    _auth: UserAuth,
) -> Result<Json<Vec<Well>>, HubError> {
    let tx = hub.store.begin().await?;
    Ok(Json(catalog::list_wells(tx).await?))
}

/// POST /api/wells
pub async fn create_well<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    _auth: UserAuth,
    Json(req): Json<NewWell>,
) -> Result<(StatusCode, Json<Well>), HubError> {
    let tx = hub.store.begin().await?;
    let well = catalog::create_well(tx, &req).await?;
    Ok((StatusCode::CREATED, Json(well)))
}

/// GET /api/well-states?well_id=&latest=
pub async fn list_well_states<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    _auth: UserAuth,
    Query(query): Query<WellStateQuery>,
) -> Result<Json<Vec<WellState>>, HubError> {
    let tx = hub.store.begin().await?;
    Ok(Json(catalog::list_well_states(tx, query).await?))
}

/// POST /api/well-states — Append a raw snapshot (no reconciliation)
pub async fn create_well_state<S: Store>(
    State(hub): State<Arc<HubState<S>>>,
    _auth: UserAuth,
    Json(req): Json<NewWellState>,
) -> Result<(StatusCode, Json<WellState>), HubError> {
    let tx = hub.store.begin().await?;
    let state = catalog::create_well_state(tx, &req).await?;
    Ok((StatusCode::CREATED, Json(state)))
}
