use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dotenvy::dotenv;
use futures::StreamExt;
use redis::AsyncCommands;
use tokio::time;
use tracing::{error, info, instrument, warn};

use yield_strategy_engine::auth::{EnvWalletAuth, WalletAuth};
use yield_strategy_engine::config;
use yield_strategy_engine::logging;
use yield_strategy_engine::protocol::registry::ProtocolRegistry;
use yield_strategy_engine::store::kv::{KvStore, RedisKvStore};
use yield_strategy_engine::store::strategies::StrategyManager;
use yield_strategy_engine::strategy::engine;

const PROTOCOL_DATA_UPDATED_CHANNEL: &str = "protocol_data_updated";
const STRATEGIES_REFRESHED_CHANNEL: &str = "strategies_refreshed";
const LAST_REFRESH_KEY: &str = "strategies:last_refresh";

#[instrument(name = "strategy_service_main")]
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
    info!(redis_url = %cfg.redis_url, "Configuration loaded and logging initialized");

    // Connect the key-value store
    let store = Arc::new(RedisKvStore::connect(&cfg.redis_url).await?);
    info!("Key-value store connected");

    // Authenticate the wallet that owns the strategy list
    let mut auth = EnvWalletAuth::new(&cfg)?;
    let user = auth.authenticate().await?;
    let manager = StrategyManager::new(store.clone(), user.address);
    info!(owner = ?user.address, "Strategy manager initialized");

    // Load the protocol catalog, preferring the store over the seed file
    let mut registry = ProtocolRegistry::new();
    if !registry.load_from_store(store.as_ref()).await? {
        registry.load_from_file(&cfg.protocols_file)?;
    }
    info!(protocol_count = registry.len(), "Protocol catalog loaded");

    // Subscribe to protocol data updates
    let redis_client = redis::Client::open(cfg.redis_url.as_str())?;
    let mut pubsub = redis_client.get_async_pubsub().await?;
    pubsub.subscribe(PROTOCOL_DATA_UPDATED_CHANNEL).await?;
    let mut messages = pubsub.on_message();
    let mut publish_conn = redis_client.get_multiplexed_async_connection().await?;

    let cadence = Duration::minutes(cfg.refresh_interval_mins);
    let mut last_refresh = read_last_refresh(store.as_ref()).await;

    info!("Waiting for protocol_data_updated signals");
    loop {
        let now = Utc::now();
        let ready_at = last_refresh.map(|t| t + cadence);

        if let Some(ready_at) = ready_at {
            if now < ready_at {
                let wait = (ready_at - now)
                    .to_std()
                    .unwrap_or_else(|_| std::time::Duration::from_secs(0));
                tokio::select! {
                    msg = messages.next() => {
                        if let Some(msg) = msg {
                            let payload: String = msg.get_payload().unwrap_or_default();
                            info!(payload = %payload, "Received protocol data update signal");
                            if let Some(last_refresh) = last_refresh {
                                let elapsed = Utc::now() - last_refresh;
                                if elapsed < cadence {
                                    info!(
                                        elapsed_minutes = %elapsed.num_minutes(),
                                        "Skipping refresh due to cadence"
                                    );
                                }
                            }
                        } else {
                            warn!("Protocol data pubsub stream ended");
                            break;
                        }
                    }
                    _ = time::sleep(wait) => {
                        continue;
                    }
                }
                continue;
            }
        }

        match time::timeout(std::time::Duration::from_secs(600), messages.next()).await {
            Ok(Some(msg)) => {
                let payload: String = msg.get_payload().unwrap_or_default();
                info!(payload = %payload, "Received protocol data update signal");

                // Pick up whatever the collector wrote since the last cycle
                if let Err(e) = registry.load_from_store(store.as_ref()).await {
                    error!(error = ?e, "Failed to reload protocol catalog");
                    continue;
                }

                let refresh_started_at = Utc::now();
                let outcome =
                    engine::run_refresh_cycle(&manager, &registry, last_refresh, refresh_started_at)
                        .await?;
                info!(
                    strategies_total = outcome.strategies_total,
                    rebalance_due = ?outcome.rebalance_due,
                    "Refresh cycle completed"
                );

                if let Err(e) = store
                    .set(
                        LAST_REFRESH_KEY,
                        serde_json::Value::String(refresh_started_at.to_rfc3339()),
                    )
                    .await
                {
                    error!(error = ?e, "Failed to record last refresh timestamp");
                } else {
                    let _: () = publish_conn
                        .publish(STRATEGIES_REFRESHED_CHANNEL, refresh_started_at.to_rfc3339())
                        .await
                        .unwrap_or(());
                }

                last_refresh = Some(refresh_started_at);
            }
            Ok(None) => {
                warn!("Protocol data pubsub stream ended");
                break;
            }
            Err(_) => {
                error!("Did not receive protocol data update signal within 10 minutes after cadence window");
                break;
            }
        }
    }

    Ok(())
}

async fn read_last_refresh(store: &dyn KvStore) -> Option<DateTime<Utc>> {
    match store.get(LAST_REFRESH_KEY).await {
        Ok(Some(value)) => value
            .as_str()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Utc)),
        Ok(None) => None,
        Err(e) => {
            warn!(error = ?e, "Failed to read last refresh timestamp");
            None
        }
    }
}
