//! Hail main server binary.

use std::net::SocketAddr;

use main_server::{config::Config, create_app, create_state, init_tracing};
use store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    tracing::info!(
        has_database = config.has_database(),
        has_maps = config.has_maps(),
        "Starting Hail server"
    );

    match config.database_url.clone() {
        Some(url) => {
            let store = PgStore::connect(&url, config.db_max_connections).await?;
            serve(config, store).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data will not survive a restart");
            serve(config, MemoryStore::new()).await
        }
    }
}

async fn serve<S: Store>(config: Config, store: S) -> anyhow::Result<()> {
    let addr: SocketAddr = config.server_addr().parse()?;
    let app = create_app(create_state(config, store));

    tracing::info!(addr = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
