use super::strategy_constants::{EMPTY_SET_RISK, MAX_RISK_LEVEL, MIN_RISK_LEVEL};
use super::types::AllocationEntry;

/// Blended APY over the allocation set, weighted by each entry's percentage.
/// The unrounded value is the one callers store and chain; two-decimal
/// formatting belongs at display boundaries only.
pub fn compute_estimated_apy(entries: &[AllocationEntry]) -> f64 {
    entries
        .iter()
        .map(|e| e.apy * e.percentage as f64 / 100.0)
        .sum()
}

/// Percentage-weighted risk band, rounded to the nearest integer and held
/// inside 1..=5. An empty set reports risk 1 (a floor, not a computed zero).
pub fn compute_estimated_risk(entries: &[AllocationEntry]) -> u8 {
    if entries.is_empty() {
        return EMPTY_SET_RISK;
    }
    let weighted: f64 = entries
        .iter()
        .map(|e| e.risk_level as f64 * e.percentage as f64 / 100.0)
        .sum();
    (weighted.round() as i64).clamp(MIN_RISK_LEVEL as i64, MAX_RISK_LEVEL as i64) as u8
}
