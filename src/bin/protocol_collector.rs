use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dotenvy::dotenv;
use eyre::eyre;
use redis::AsyncCommands;
use tokio::time::interval;
use tracing::{error, info, instrument};

use yield_strategy_engine::config;
use yield_strategy_engine::logging;
use yield_strategy_engine::protocol::api_client::YieldsApiClient;
use yield_strategy_engine::protocol::registry::ProtocolRegistry;
use yield_strategy_engine::store::kv::RedisKvStore;

const PROTOCOL_DATA_UPDATED_CHANNEL: &str = "protocol_data_updated";

#[instrument(name = "protocol_collector_main")]
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
    let yields_api_url = cfg
        .yields_api_url
        .clone()
        .ok_or_else(|| eyre!("YIELDS_API_URL must be set for the collector"))?;
    info!(yields_api_url = %yields_api_url, "Configuration loaded and logging initialized");

    // Connect the key-value store
    let store = Arc::new(RedisKvStore::connect(&cfg.redis_url).await?);
    info!("Key-value store connected");

    // Load the protocol catalog, preferring the store over the seed file
    let mut registry = ProtocolRegistry::new();
    if !registry.load_from_store(store.as_ref()).await? {
        registry.load_from_file(&cfg.protocols_file)?;
        registry.save_to_store(store.as_ref()).await?;
    }
    info!(protocol_count = registry.len(), "Protocol catalog loaded");

    // Initialize the yields API client
    let api_client = YieldsApiClient::new(&yields_api_url);
    info!("Yields API client initialized");

    // Publish connection for update signals
    let redis_client = redis::Client::open(cfg.redis_url.as_str())?;
    let mut publish_conn = redis_client.get_multiplexed_async_connection().await?;

    // Periodically fetch yields, merge, persist, and signal
    let mut ticker = interval(Duration::from_secs(cfg.collect_interval_secs));
    info!(
        interval_secs = cfg.collect_interval_secs,
        "Starting protocol collection loop"
    );

    loop {
        ticker.tick().await;
        info!("Protocol collection cycle started");

        let updates = match api_client.fetch_yields().await {
            Ok(updates) => updates,
            Err(e) => {
                error!(error = ?e, "Failed to fetch yields; keeping previous catalog");
                continue;
            }
        };

        let (updated_count, unknown_count) = registry.apply_yields(&updates);

        if let Err(e) = registry.save_to_store(store.as_ref()).await {
            error!(error = ?e, "Failed to persist protocol catalog");
            continue;
        }

        let collected_at = Utc::now();
        let _: () = publish_conn
            .publish(PROTOCOL_DATA_UPDATED_CHANNEL, collected_at.to_rfc3339())
            .await
            .unwrap_or(());

        info!(
            updated_count,
            unknown_count,
            "Protocol collection cycle completed"
        );
    }
}
