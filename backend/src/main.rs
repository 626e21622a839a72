use std::net::SocketAddr;
use std::sync::Arc;

use fanpit::store::{MemoryStore, PgStore, Store};
use fanpit::{create_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!(
        "Loaded config (verify_payments: {}, ipfs: {})",
        config.verify_payments,
        config.ipfs_api_url.is_some()
    );

    let store: Arc<dyn Store> = if config.uses_memory_store() {
        log::warn!("DATABASE_URL not set, records will be kept in memory only");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(PgStore::connect(&config.database_url, config.db_pool_size)?)
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(config, store);
    if let Some(solana) = &state.solana {
        log::info!("Payment verification via {}", solana.rpc_url());
    }

    let app = create_router(state);

    log::info!("Starting server on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app.into_make_service()).await?;

    Ok(())
}
