//! Database connection pool and migration runner

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::config::HubConfig;

/// Create a PostgreSQL connection pool
pub async fn create_pool(config: &HubConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.database_url)
        .await?;

    info!(max_connections = config.max_connections, "Connected to PostgreSQL");
    Ok(pool)
}

/// Run database migrations from the migrations/ directory
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Migrations complete");
    Ok(())
}
