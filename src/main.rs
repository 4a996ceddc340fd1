//! GasDyn Hub — report server binary
//!
//! ```bash
//! # PostgreSQL-backed
//! DATABASE_URL=postgres://postgres@localhost/gasdynamicdb cargo run --release
//!
//! # Throwaway in-memory store for local runs
//! cargo run -- --in-memory --port 8000
//! ```
//!
//! ## Environment variables
//!
//! | Variable                  | Required       | Description                            |
//! |---------------------------|----------------|----------------------------------------|
//! | `DATABASE_URL`            | Unless memory  | PostgreSQL connection string           |
//! | `GASDYN_PASSPHRASE`       | Release builds | Shared service passphrase              |
//! | `GASDYN_CONFIG`           | No             | Path to a TOML config file             |
//! | `GASDYN_STATE_TOLERANCE`  | No             | Well-state change tolerance (default 0) |
//! | `GASDYN_MAX_PAYLOAD_SIZE` | No             | Request body limit in bytes            |
//! | `RUST_LOG`                | No             | Log filter (default: info)             |

use clap::Parser;
use gasdyn_hub::api::build_router;
use gasdyn_hub::{db, HubConfig, HubState, MemoryStore, PgStore, Store};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "gasdyn-hub", about = "GasDyn Hub — well report server", version)]
struct CliArgs {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Port to listen on (default: 8000)
    #[arg(long, short)]
    port: Option<u16>,

    /// Bind address (overrides --port)
    #[arg(long)]
    bind_address: Option<String>,

    /// Keep all data in process memory (lost on exit)
    #[arg(long)]
    in_memory: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,gasdyn_hub=debug"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    init_tracing(args.log_json);

    // Fails in release when GASDYN_PASSPHRASE is not set
    let config = HubConfig::from_env(
        args.config,
        args.database_url,
        args.bind_address,
        args.port,
    )?;

    info!(
        bind = %config.bind_address,
        tolerance = config.state_tolerance,
        "Starting GasDyn Hub"
    );

    if args.in_memory {
        warn!("Running with the in-memory store; data is discarded on exit");
        let state = HubState::new(MemoryStore::new(), config);
        return serve(state).await;
    }

    if config.database_url.is_empty() {
        anyhow::bail!("DATABASE_URL must be set via --database-url or DATABASE_URL env var");
    }

    // ── Database ──────────────────────────────────────────────────────────────
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    let state = HubState::new(PgStore::new(pool), config);
    serve(state).await
}

async fn serve<S: Store>(state: Arc<HubState<S>>) -> anyhow::Result<()> {
    let bind_address = state.config.bind_address.clone();
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "GasDyn Hub listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("GasDyn Hub shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
