use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use super::metrics;
use super::types::Strategy;
use crate::protocol::registry::ProtocolRegistry;
use crate::store::strategies::StrategyManager;

/// Summary of one refresh cycle over a wallet's saved strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub strategies_total: usize,
    /// Allocation entries whose protocol is no longer in the catalog; their
    /// stale APY figures were kept.
    pub stale_entries: usize,
    /// Ids of active strategies whose rebalance interval has elapsed.
    pub rebalance_due: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Entry point for the refresh engine — run whenever protocol data changes.
/// Re-resolves every allocation's APY from the catalog, recomputes blended
/// APY, flags strategies owed a rebalance, and persists the updated list.
pub async fn run_refresh_cycle(
    manager: &StrategyManager,
    registry: &ProtocolRegistry,
    last_refresh: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> eyre::Result<RefreshOutcome> {
    info!(owner = ?manager.owner(), "Starting strategy refresh cycle");

    let mut strategies = manager.list().await?;
    if strategies.is_empty() {
        info!("No stored strategies to refresh");
        return Ok(RefreshOutcome {
            strategies_total: 0,
            stale_entries: 0,
            rebalance_due: Vec::new(),
            completed_at: now,
        });
    }

    let apy_by_id: HashMap<&str, f64> = registry
        .candidates()
        .iter()
        .map(|p| (p.id.as_str(), p.apy))
        .collect();

    // Per-strategy recompute in parallel; each strategy is independent
    let stale_counts: Vec<usize> = strategies
        .par_iter_mut()
        .map(|strategy| {
            let mut stale = 0;
            for entry in &mut strategy.allocations {
                match apy_by_id.get(entry.id.as_str()) {
                    Some(apy) => entry.apy = *apy,
                    None => stale += 1,
                }
            }
            strategy.estimated_apy = metrics::compute_estimated_apy(&strategy.allocations);
            stale
        })
        .collect();
    let stale_entries: usize = stale_counts.into_iter().sum();
    if stale_entries > 0 {
        warn!(
            stale_entries,
            "Some allocations reference protocols missing from the catalog"
        );
    }

    let rebalance_due: Vec<String> = strategies
        .iter()
        .filter(|s| s.rebalance_due(last_refresh, now))
        .map(|s| s.id.clone())
        .collect();

    manager.save_all(&strategies).await?;
    log_strategy_summary(&strategies);

    let outcome = RefreshOutcome {
        strategies_total: strategies.len(),
        stale_entries,
        rebalance_due,
        completed_at: now,
    };
    info!(
        strategies_total = outcome.strategies_total,
        stale_entries = outcome.stale_entries,
        rebalance_due = ?outcome.rebalance_due,
        "Strategy refresh cycle completed"
    );
    Ok(outcome)
}

/// Formatted strategy summary, highest blended APY first.
pub fn log_strategy_summary(strategies: &[Strategy]) {
    let mut sorted: Vec<&Strategy> = strategies.iter().collect();
    sorted.sort_by(|a, b| {
        b.estimated_apy
            .partial_cmp(&a.estimated_apy)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let output = sorted
        .iter()
        .map(|s| {
            format!(
                "{} ({}): est apy {:.2}% | risk {} | {} | {} allocations | {}",
                s.name,
                s.strategy_type.as_str(),
                s.estimated_apy,
                s.risk_level,
                s.rebalance_frequency.as_str(),
                s.allocations.len(),
                if s.active { "active" } else { "paused" },
            )
        })
        .collect::<Vec<String>>()
        .join("\n");
    info!(strategies = %output, "Strategy summary");
}
