//! Hub API route registration

pub mod admin;
pub mod catalog;
pub mod health;
pub mod reports;
pub mod users;

use crate::store::Store;
use crate::HubState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the complete hub API router
pub fn build_router<S: Store>(state: Arc<HubState<S>>) -> Router {
    let max_payload = state.config.max_payload_size;

    let api_routes = Router::new()
        // Users
        .route("/users", post(users::register_user::<S>))
        // Catalog
        .route(
            "/locations",
            get(catalog::list_locations::<S>).post(catalog::create_location::<S>),
        )
        .route(
            "/clusters",
            get(catalog::list_clusters::<S>).post(catalog::create_cluster::<S>),
        )
        .route(
            "/wells",
            get(catalog::list_wells::<S>).post(catalog::create_well::<S>),
        )
        .route(
            "/well-states",
            get(catalog::list_well_states::<S>).post(catalog::create_well_state::<S>),
        )
        // Reports
        .route(
            "/reports",
            get(reports::list_reports::<S>).post(reports::apply_report::<S>),
        )
        .route(
            "/reports/:id",
            get(reports::get_report::<S>)
                .put(reports::update_report::<S>)
                .delete(reports::delete_report::<S>),
        )
        .route("/reports/:id/copy", post(reports::copy_report::<S>))
        .route("/reports/:id/share", post(reports::share_report::<S>))
        .route(
            "/reports/:id/revoke",
            axum::routing::delete(reports::revoke_access::<S>),
        )
        // Admin
        .route("/admin/reports", get(admin::list_all_reports::<S>))
        .route("/admin/users", get(admin::list_users::<S>))
        // Health
        .route("/health", get(health::get_health::<S>));

    Router::new()
        .nest("/api", api_routes)
        .layer(RequestBodyLimitLayer::new(max_payload))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
