//! CSE Motors web server binary.
//!
//! Reads configuration from the environment (and `.env`), runs migrations,
//! and serves the site until interrupted.

use std::sync::Arc;

use clap::Parser;
use motors_api::AppState;
use motors_api::config::ApiConfig;
use motors_core::store::{MemoryStore, PgStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

const DEFAULT_LOG_FILTER: &str = "info,motors_api=debug,motors_core=debug";

/// CLI arguments. Each flag overrides the matching environment variable.
#[derive(Parser, Debug)]
#[command(name = "motors_server", about = "CSE Motors web server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "PGPOOL_MAX")]
    max_connections: Option<u32>,

    /// Serve from a process-local store seeded with the default
    /// classifications instead of PostgreSQL. Data is lost on exit.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    if let Some(max) = args.max_connections {
        config.pool_max = max;
    }

    if config.auth.jwt_secret.is_none() {
        error!("ACCESS_TOKEN_SECRET (or JWT_SECRET) is not set; refusing to start");
        return Err("ACCESS_TOKEN_SECRET is not set".into());
    }

    info!(
        bind = %config.bind_addr,
        production = config.production,
        in_memory = args.in_memory,
        token_ttl_secs = config.auth.token_ttl.num_seconds(),
        "starting motors_server"
    );

    let state = if args.in_memory {
        warn!("using the in-memory store; data will not persist");
        AppState::new(Arc::new(MemoryStore::seeded()), config.clone())
    } else {
        info!(max_connections = config.pool_max, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&config.database_url)
            .await?;

        info!("running database migrations");
        motors_api::migrate(&pool).await?;

        let store = PgStore::new(pool);
        if !store.health_check().await {
            return Err("database health check failed".into());
        }
        AppState::new(Arc::new(store), config.clone())
    };

    let _cleanup = state.sessions.spawn_cleanup_task();
    let app = motors_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
