use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{info, instrument};

use yield_strategy_engine::config;
use yield_strategy_engine::logging;
use yield_strategy_engine::protocol::registry::ProtocolRegistry;
use yield_strategy_engine::store::kv::RedisKvStore;

#[instrument(name = "seed_protocols_main")]
#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e.into());
    }

    // Load configuration
    let cfg = config::Config::load();
    info!(file = %cfg.protocols_file, "Configuration loaded and logging initialized");

    // Connect the key-value store
    let store = Arc::new(RedisKvStore::connect(&cfg.redis_url).await?);
    info!("Key-value store connected");

    // Load the seed catalog and write it to the store
    let mut registry = ProtocolRegistry::new();
    let loaded_count = registry.load_from_file(&cfg.protocols_file)?;
    registry.save_to_store(store.as_ref()).await?;
    registry.log_catalog();
    info!(loaded_count, "Protocol catalog seeded into the store");

    tokio::time::sleep(std::time::Duration::from_secs(1)).await; // Allow time for logging to flush

    Ok(())
}
