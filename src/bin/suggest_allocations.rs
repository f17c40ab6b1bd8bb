use dotenvy::dotenv;
use eyre::eyre;
use std::env;
use tracing::{info, instrument};

use yield_strategy_engine::config;
use yield_strategy_engine::logging;
use yield_strategy_engine::protocol::registry::ProtocolRegistry;
use yield_strategy_engine::strategy::allocator;
use yield_strategy_engine::strategy::metrics;
use yield_strategy_engine::strategy::types::StrategyArchetype;

#[instrument(name = "suggest_allocations_main")]
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

    // Read the archetype/risk pair to suggest for
    let strategy_type = env::var("STRATEGY_TYPE").unwrap_or_else(|_| "balanced".to_string());
    let strategy_type = StrategyArchetype::from_str(&strategy_type)
        .ok_or_else(|| eyre!("Unknown STRATEGY_TYPE: {strategy_type}"))?;
    let risk_tolerance: u8 = env::var("RISK_TOLERANCE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);
    info!(
        strategy_type = %strategy_type.as_str(),
        risk_tolerance,
        "Configuration loaded and logging initialized"
    );

    // Load the seed catalog
    let mut registry = ProtocolRegistry::new();
    registry.load_from_file(&cfg.protocols_file)?;

    let entries = allocator::generate_suggested_allocations(
        strategy_type,
        risk_tolerance,
        registry.candidates(),
    );

    let output = entries
        .iter()
        .map(|e| {
            format!(
                "{}: {}% | apy {:.2}% | risk {}",
                e.id, e.percentage, e.apy, e.risk_level
            )
        })
        .collect::<Vec<String>>()
        .join("\n");
    info!(allocations = %output, "Suggested allocations");
    info!(
        estimated_apy = format!("{:.2}", metrics::compute_estimated_apy(&entries)),
        estimated_risk = metrics::compute_estimated_risk(&entries),
        "Blended metrics"
    );

    tokio::time::sleep(std::time::Duration::from_secs(1)).await; // Allow time for logging to flush

    Ok(())
}
