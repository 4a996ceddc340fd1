//! PostgreSQL store tests
//!
//! Run against a scratch database:
//!
//! ```bash
//! GASDYN_TEST_DATABASE_URL=postgres://postgres@localhost/gasdyn_test cargo test --test pg_store
//! ```
//!
//! Skipped (pass trivially) when the variable is not set.

use gasdyn_hub::config::HubConfig;
use gasdyn_hub::types::{ApplyReport, NewCluster, NewLocation, NewUser, NewWell, User};
use gasdyn_hub::workflow::{self, catalog};
use gasdyn_hub::{db, HubError, PgStore, Store, StoreTx};
use uuid::Uuid;

async fn test_store() -> Option<PgStore> {
    let Ok(url) = std::env::var("GASDYN_TEST_DATABASE_URL") else {
        eprintln!("GASDYN_TEST_DATABASE_URL not set, skipping");
        return None;
    };
    let config = HubConfig {
        database_url: url,
        max_connections: 4,
        ..HubConfig::default()
    };
    let pool = db::create_pool(&config).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    Some(PgStore::new(pool))
}

/// Unique suffix so repeated runs never collide on unique columns.
fn tag() -> String {
    Uuid::new_v4().simple().to_string()
}

async fn register(store: &PgStore, prefix: &str) -> User {
    catalog::register_user(
        store.begin().await.unwrap(),
        &NewUser {
            email: format!("{prefix}-{}@field.example", tag()),
            is_admin: false,
        },
    )
    .await
    .unwrap()
}

async fn seed_well(store: &PgStore) -> Uuid {
    let location = catalog::create_location(
        store.begin().await.unwrap(),
        &NewLocation {
            name: format!("Field {}", tag()),
        },
    )
    .await
    .unwrap();
    let cluster = catalog::create_cluster(
        store.begin().await.unwrap(),
        &NewCluster {
            name: "Pad 1".to_string(),
            location_id: location.id,
        },
    )
    .await
    .unwrap();
    catalog::create_well(
        store.begin().await.unwrap(),
        &NewWell {
            name: "W-1".to_string(),
            cluster_id: cluster.id,
        },
    )
    .await
    .unwrap()
    .id
}

fn measurement(well_id: Uuid, depth: f64, pressure: f64) -> ApplyReport {
    ApplyReport {
        external_id: None,
        title: Some("pg".to_string()),
        well_id,
        depth: Some(depth),
        pressure: Some(pressure),
    }
}

#[tokio::test]
async fn test_pg_apply_update_and_delete() {
    let Some(store) = test_store().await else {
        return;
    };
    let owner = register(&store, "owner").await;
    let well_id = seed_well(&store).await;

    let created = workflow::apply_report(
        store.begin().await.unwrap(),
        &measurement(well_id, 100.0, 50.0),
        &owner,
        0.0,
    )
    .await
    .unwrap();
    assert_eq!(created.calculated.as_ref().unwrap().required_charges, Some(5));

    // Unchanged measurement reuses the snapshot
    let again = workflow::apply_report(
        store.begin().await.unwrap(),
        &measurement(well_id, 100.0, 50.0),
        &owner,
        0.0,
    )
    .await
    .unwrap();
    assert_eq!(again.well_state_id, created.well_state_id);

    let mut request = measurement(well_id, 2000.0, 100.0);
    request.external_id = Some(created.external_id);
    let updated = workflow::apply_report(store.begin().await.unwrap(), &request, &owner, 0.0)
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.calculated.unwrap().required_charges, Some(200));

    workflow::delete_report(store.begin().await.unwrap(), created.external_id, &owner)
        .await
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(tx
        .find_report_by_external_id(created.external_id)
        .await
        .unwrap()
        .is_none());
    assert!(tx.find_calculated(created.id).await.unwrap().is_none());
    assert!(tx
        .find_well_state(created.well_state_id)
        .await
        .unwrap()
        .is_some());
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn test_pg_share_conflict_and_forbidden_update() {
    let Some(store) = test_store().await else {
        return;
    };
    let owner = register(&store, "owner").await;
    let reader = register(&store, "reader").await;
    let well_id = seed_well(&store).await;

    let created = workflow::apply_report(
        store.begin().await.unwrap(),
        &measurement(well_id, 100.0, 50.0),
        &owner,
        0.0,
    )
    .await
    .unwrap();

    workflow::share_report(
        store.begin().await.unwrap(),
        created.external_id,
        &owner,
        &reader.email,
        false,
    )
    .await
    .unwrap();
    let err = workflow::share_report(
        store.begin().await.unwrap(),
        created.external_id,
        &owner,
        &reader.email,
        false,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HubError::Conflict(_)));

    let mut request = measurement(well_id, 999.0, 99.0);
    request.external_id = Some(created.external_id);
    let err = workflow::apply_report(store.begin().await.unwrap(), &request, &reader, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Forbidden(_)));

    let listed = workflow::list_reports(
        store.begin().await.unwrap(),
        &reader,
        &Default::default(),
    )
    .await
    .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].well_state_id, created.well_state_id);
}

#[tokio::test]
async fn test_pg_unique_violation_maps_to_conflict() {
    let Some(store) = test_store().await else {
        return;
    };
    let user = register(&store, "dup").await;

    let mut tx = store.begin().await.unwrap();
    let err = tx
        .insert_user(&NewUser {
            email: user.email.clone(),
            is_admin: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Conflict(_)));
    tx.rollback().await.unwrap();
}
