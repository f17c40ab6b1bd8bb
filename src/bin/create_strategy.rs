use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use eyre::eyre;
use tracing::{info, instrument};

use yield_strategy_engine::auth::{EnvWalletAuth, WalletAuth};
use yield_strategy_engine::config;
use yield_strategy_engine::logging;
use yield_strategy_engine::protocol::registry::ProtocolRegistry;
use yield_strategy_engine::store::kv::RedisKvStore;
use yield_strategy_engine::store::strategies::StrategyManager;
use yield_strategy_engine::strategy::draft::StrategyDraft;
use yield_strategy_engine::strategy::types::{RebalanceFrequency, StrategyArchetype};

#[instrument(name = "create_strategy_main")]
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

    // Read strategy parameters
    let name = env::var("STRATEGY_NAME").map_err(|_| eyre!("STRATEGY_NAME must be set"))?;
    let strategy_type = env::var("STRATEGY_TYPE").unwrap_or_else(|_| "balanced".to_string());
    let strategy_type = StrategyArchetype::from_str(&strategy_type)
        .ok_or_else(|| eyre!("Unknown STRATEGY_TYPE: {strategy_type}"))?;
    let risk_tolerance: u8 = env::var("RISK_TOLERANCE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);
    let frequency = env::var("REBALANCE_FREQUENCY").unwrap_or_else(|_| "weekly".to_string());
    let frequency = RebalanceFrequency::from_str(&frequency)
        .ok_or_else(|| eyre!("Unknown REBALANCE_FREQUENCY: {frequency}"))?;
    info!(
        name = %name,
        strategy_type = %strategy_type.as_str(),
        risk_tolerance,
        frequency = %frequency.as_str(),
        "Configuration loaded and logging initialized"
    );

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

    // Drive the draft end to end and persist the result
    let candidates = registry.candidates();
    let mut draft = StrategyDraft::new(candidates);
    draft.set_name(&name);
    draft.set_archetype(strategy_type, candidates);
    draft.set_risk_tolerance(risk_tolerance, candidates);
    draft.set_frequency(frequency);
    draft.advance()?;
    draft.advance()?;
    let strategy = draft.finalize()?;

    info!(
        id = %strategy.id,
        estimated_apy = format!("{:.2}", strategy.estimated_apy),
        allocation_count = strategy.allocations.len(),
        "Strategy finalized"
    );
    manager.upsert(strategy).await?;
    info!("Strategy saved");

    tokio::time::sleep(std::time::Duration::from_secs(1)).await; // Allow time for logging to flush

    Ok(())
}
