//! Bank ledger service - main application entry point.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Pick the store: PostgreSQL when `DATABASE_URL` is set (pool and
//!    migrations included), otherwise the in-memory store
//! 3. Build the HTTP router with routes and middleware
//! 4. Start the server on the configured port

use bank_ledger::{
    config::Config,
    db,
    routes::{self, AppState},
    store::{MemoryStore, PgStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(port = config.server_port, "configuration loaded");

    let state = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::create_pool(url, config.database_max_connections).await?;
            tracing::info!("database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("database migrations complete");

            AppState::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            AppState::new(MemoryStore::new())
        }
    };

    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
