use std::sync::Arc;

use certdesk_api::app::{router, AppState};
use certdesk_api::database::{DatabaseManager, PgStore};
use certdesk_api::{config, is_development};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    certdesk_api::init_tracing("certdesk_api=info,tower_http=info");

    let config = config::config();
    tracing::info!("Starting CertDesk API in {:?} mode", config.environment);
    if is_development!() {
        tracing::warn!("Development mode: default JWT secret and seed credentials may be in use");
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let store = Arc::new(PgStore::connect().await?);
    let state = AppState::new(store);

    if config.seed.run_on_startup {
        let report = state.seeder().run().await?;
        tracing::info!("Startup seeding finished: {:?}", report);
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("CertDesk API listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
