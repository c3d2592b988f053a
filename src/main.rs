use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use cycletrack_backend::auth::PgAuthService;
use cycletrack_backend::config::AppConfig;
use cycletrack_backend::routes::{self, AppState};
use cycletrack_backend::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("📦 migrations applied");
    }

    let state = AppState {
        store: Arc::new(PgStore::new(pool.clone())),
        auth: Arc::new(PgAuthService::new(pool, config.auth.session_ttl())),
    };
    let app = routes::app(state);

    let addr = config.server.socket_addr()?;
    tracing::info!("🧠 Server running at {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
