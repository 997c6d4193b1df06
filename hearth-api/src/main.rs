//! # Hearth API Server
//!
//! Serves the household membership API over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) DATABASE_URL=postgresql://localhost/hearth \
//!     cargo run -p hearth-api
//! ```
//!
//! Set `STORE_BACKEND=memory` to run without PostgreSQL and `LOG_FORMAT=json`
//! for JSON log lines.

use hearth_api::{
    app::{build_router, AppState},
    config::{Config, StoreBackend},
};
use hearth_shared::db::{migrations, pool};
use hearth_shared::store::{memory::InMemoryMembershipStore, postgres::PgMembershipStore, MembershipStore};
use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Hearth API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let (store, pool): (Arc<dyn MembershipStore>, Option<PgPool>) = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = pool::create_pool(pool::DatabaseConfig {
                url: config.database.url.clone(),
                max_connections: config.database.max_connections,
                ..Default::default()
            })
            .await?;
            migrations::run_migrations(&pool).await?;

            (Arc::new(PgMembershipStore::new(pool.clone())), Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            (Arc::new(InMemoryMembershipStore::new()), None)
        }
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, draining connections...");
    if let Some(pool) = pool {
        pool::close_pool(pool).await;
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hearth_api=debug,hearth_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
