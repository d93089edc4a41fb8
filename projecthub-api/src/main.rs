//! # ProjectHub API Server
//!
//! Serves the project collaboration API: accounts, projects and their
//! memberships, kanban tasks, issues with comments, files and activity.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/projecthub \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p projecthub-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use projecthub_api::{
    app::{build_router, AppState},
    config::Config,
};
use projecthub_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    storage::LocalBlobStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "projecthub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "ProjectHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig::new(
        config.database.url.clone(),
        config.database.max_connections,
    ))
    .await
    .context("Failed to connect to database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let blobs = LocalBlobStore::new(&config.storage.dir)
        .await
        .with_context(|| format!("Failed to open storage dir {}", config.storage.dir.display()))?;

    let addr = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, Arc::new(blobs)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool");
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
