use std::cmp::Ordering;
use tracing::{debug, warn};

use super::strategy_constants::{CONSERVATIVE_MAX_RISK, MAX_SUGGESTED_ENTRIES, TOTAL_PERCENTAGE};
use super::types::{AllocationEntry, StrategyArchetype};
use crate::protocol::types::ProtocolInfo;

/// Build a suggested allocation set for an archetype over the candidate
/// protocols. Conservative keeps only low-risk candidates, aggressive chases
/// APY, balanced takes the catalog as-is; at most four protocols are funded.
pub fn generate_suggested_allocations(
    strategy_type: StrategyArchetype,
    risk_tolerance: u8,
    candidates: &[ProtocolInfo],
) -> Vec<AllocationEntry> {
    let mut picks: Vec<&ProtocolInfo> = match strategy_type {
        StrategyArchetype::Conservative => candidates
            .iter()
            .filter(|p| p.risk_level <= CONSERVATIVE_MAX_RISK)
            .collect(),
        StrategyArchetype::Aggressive => {
            let mut sorted: Vec<&ProtocolInfo> = candidates.iter().collect();
            // Stable sort, so equal-APY candidates keep their catalog order
            sorted.sort_by(|a, b| b.apy.partial_cmp(&a.apy).unwrap_or(Ordering::Equal));
            sorted
        }
        StrategyArchetype::Balanced => candidates.iter().collect(),
    };
    picks.truncate(MAX_SUGGESTED_ENTRIES);

    if picks.is_empty() {
        debug!(
            strategy_type = %strategy_type.as_str(),
            risk_tolerance,
            candidate_count = candidates.len(),
            "No candidates qualified for a suggestion"
        );
        return Vec::new();
    }

    let count = picks.len();
    let mut remaining = TOTAL_PERCENTAGE;
    let mut entries = Vec::with_capacity(count);

    for (index, protocol) in picks.iter().enumerate() {
        let percentage = if index == 0 {
            strategy_type.front_load()
        } else {
            // Each later entry splits what is actually left, so rounding
            // error is absorbed downstream instead of accumulating
            (remaining as f64 / (count - index) as f64).round() as i32
        };
        remaining -= percentage;

        entries.push(AllocationEntry {
            id: protocol.id.clone(),
            percentage,
            apy: protocol.apy,
            risk_level: protocol.risk_level,
        });
    }

    // Fold any unassigned residue into the first entry. With the current
    // front-loads this only fires for single-entry sets.
    let assigned: i32 = entries.iter().map(|e| e.percentage).sum();
    if assigned != TOTAL_PERCENTAGE {
        entries[0].percentage += TOTAL_PERCENTAGE - assigned;
    }

    entries
}

/// Apply a manual percentage edit and rebalance every other entry
/// proportionally to its share of the pre-edit remainder, clamped at zero.
/// When all other entries are already at zero the set is returned off-total
/// rather than inventing a distribution.
pub fn update_allocation(
    current: &[AllocationEntry],
    id: &str,
    percentage: i32,
) -> Vec<AllocationEntry> {
    let mut entries = current.to_vec();

    let Some(edited_index) = entries.iter().position(|e| e.id == id) else {
        warn!(id, "Edited allocation id not present in set");
        return entries;
    };
    entries[edited_index].percentage = percentage;

    let total: i32 = entries.iter().map(|e| e.percentage).sum();
    let diff = TOTAL_PERCENTAGE - total;
    if diff == 0 || entries.len() <= 1 {
        return entries;
    }

    let sum_of_others: i32 = entries
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != edited_index)
        .map(|(_, e)| e.percentage)
        .sum();

    if sum_of_others == 0 {
        warn!(
            id,
            total,
            "All other allocations are zero; set no longer sums to 100"
        );
        return entries;
    }

    for (i, entry) in entries.iter_mut().enumerate() {
        if i == edited_index {
            continue;
        }
        let share = entry.percentage as f64 / sum_of_others as f64;
        let adjusted = (entry.percentage as f64 + diff as f64 * share).round() as i32;
        entry.percentage = adjusted.max(0);
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn candidate(id: &str, apy: f64, risk_level: u8) -> ProtocolInfo {
        ProtocolInfo {
            id: id.to_string(),
            name: id.to_string(),
            symbol: id.to_uppercase(),
            apy,
            tvl_usd: Decimal::ZERO,
            risk_level,
        }
    }

    fn entry(id: &str, percentage: i32) -> AllocationEntry {
        AllocationEntry {
            id: id.to_string(),
            percentage,
            apy: 5.0,
            risk_level: 3,
        }
    }

    fn percentages(entries: &[AllocationEntry]) -> Vec<(String, i32)> {
        entries
            .iter()
            .map(|e| (e.id.clone(), e.percentage))
            .collect()
    }

    #[test]
    fn balanced_suggestion_caps_entries_and_sums_to_100() {
        let candidates = vec![
            candidate("aave", 4.5, 2),
            candidate("compound", 3.8, 2),
            candidate("curve", 8.2, 3),
            candidate("uniswap", 12.4, 4),
            candidate("gmx", 21.0, 5),
            candidate("lido", 3.9, 2),
        ];

        let entries = generate_suggested_allocations(StrategyArchetype::Balanced, 3, &candidates);

        assert_eq!(entries.len(), 4);
        assert_eq!(entries.iter().map(|e| e.percentage).sum::<i32>(), 100);
        // First four in catalog order, front entry at 45, remainder split with
        // the running-remainder rule: 45, 18, 19, 18
        assert_eq!(
            percentages(&entries),
            vec![
                ("aave".to_string(), 45),
                ("compound".to_string(), 18),
                ("curve".to_string(), 19),
                ("uniswap".to_string(), 18),
            ]
        );
    }

    #[test]
    fn conservative_keeps_only_low_risk_candidates() {
        let candidates = vec![
            candidate("gmx", 21.0, 5),
            candidate("aave", 4.5, 2),
            candidate("uniswap", 12.4, 4),
            candidate("curve", 8.2, 3),
            candidate("lido", 3.9, 2),
        ];

        let entries =
            generate_suggested_allocations(StrategyArchetype::Conservative, 2, &candidates);

        assert!(entries.iter().all(|e| e.risk_level <= 3));
        // Relative catalog order survives the filter
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["aave", "curve", "lido"]);
        assert_eq!(entries[0].percentage, 40);
        assert_eq!(entries.iter().map(|e| e.percentage).sum::<i32>(), 100);
    }

    #[test]
    fn conservative_with_no_qualifying_candidates_is_empty() {
        let candidates = vec![candidate("gmx", 21.0, 5), candidate("uniswap", 12.4, 4)];
        let entries =
            generate_suggested_allocations(StrategyArchetype::Conservative, 1, &candidates);
        assert!(entries.is_empty());
    }

    #[test]
    fn aggressive_sorts_by_apy_descending_before_truncation() {
        let candidates = vec![
            candidate("aave", 4.5, 2),
            candidate("gmx", 21.0, 5),
            candidate("curve", 8.2, 3),
            candidate("uniswap", 12.4, 4),
            candidate("lido", 3.9, 2),
        ];

        let entries =
            generate_suggested_allocations(StrategyArchetype::Aggressive, 5, &candidates);

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["gmx", "uniswap", "curve", "aave"]);
        assert_eq!(entries[0].percentage, 60);
        assert_eq!(entries.iter().map(|e| e.percentage).sum::<i32>(), 100);
    }

    #[test]
    fn aggressive_sort_is_stable_for_equal_apy() {
        let candidates = vec![
            candidate("first", 8.0, 3),
            candidate("second", 8.0, 3),
            candidate("third", 8.0, 3),
        ];

        let entries =
            generate_suggested_allocations(StrategyArchetype::Aggressive, 3, &candidates);

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn generation_is_deterministic() {
        let candidates = vec![
            candidate("aave", 4.5, 2),
            candidate("curve", 8.2, 3),
            candidate("gmx", 21.0, 5),
        ];

        let first = generate_suggested_allocations(StrategyArchetype::Aggressive, 4, &candidates);
        let second = generate_suggested_allocations(StrategyArchetype::Aggressive, 4, &candidates);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_candidates_produce_empty_set() {
        let entries = generate_suggested_allocations(StrategyArchetype::Balanced, 3, &[]);
        assert!(entries.is_empty());
    }

    #[test]
    fn single_candidate_takes_the_full_hundred() {
        for archetype in [
            StrategyArchetype::Conservative,
            StrategyArchetype::Balanced,
            StrategyArchetype::Aggressive,
        ] {
            let entries =
                generate_suggested_allocations(archetype, 3, &[candidate("aave", 4.5, 2)]);
            assert_eq!(entries.len(), 1);
            // The residual correction tops the lone entry up to 100
            assert_eq!(entries[0].percentage, 100);
        }
    }

    #[test]
    fn suggestion_preserves_candidate_apy_and_risk() {
        let candidates = vec![candidate("curve", 8.2, 3), candidate("aave", 4.5, 2)];
        let entries = generate_suggested_allocations(StrategyArchetype::Balanced, 3, &candidates);
        assert_eq!(entries[0].apy, 8.2);
        assert_eq!(entries[0].risk_level, 3);
        assert_eq!(entries[1].apy, 4.5);
        assert_eq!(entries[1].risk_level, 2);
    }

    #[test]
    fn two_entry_edit_moves_the_whole_diff_to_the_other() {
        let current = vec![entry("a", 60), entry("b", 40)];
        let updated = update_allocation(&current, "a", 80);
        assert_eq!(
            percentages(&updated),
            vec![("a".to_string(), 80), ("b".to_string(), 20)]
        );
    }

    #[test]
    fn three_entry_edit_distributes_proportionally() {
        let current = vec![entry("a", 50), entry("b", 30), entry("c", 20)];
        let updated = update_allocation(&current, "a", 70);
        // diff = -20, split 30:20 across b and c
        assert_eq!(
            percentages(&updated),
            vec![
                ("a".to_string(), 70),
                ("b".to_string(), 18),
                ("c".to_string(), 12)
            ]
        );
        assert_eq!(updated.iter().map(|e| e.percentage).sum::<i32>(), 100);
    }

    #[test]
    fn edit_that_keeps_the_total_leaves_others_untouched() {
        let current = vec![entry("a", 50), entry("b", 30), entry("c", 20)];
        let updated = update_allocation(&current, "a", 50);
        assert_eq!(updated, current);
    }

    #[test]
    fn other_entry_clamps_at_zero_floor() {
        let current = vec![entry("a", 60), entry("b", 40)];
        let updated = update_allocation(&current, "a", 100);
        assert_eq!(
            percentages(&updated),
            vec![("a".to_string(), 100), ("b".to_string(), 0)]
        );
    }

    #[test]
    fn zero_sum_of_others_leaves_total_unnormalized() {
        let current = vec![entry("a", 0), entry("b", 0), entry("c", 100)];
        let updated = update_allocation(&current, "c", 50);
        // No redistribution target exists; the documented leniency applies
        assert_eq!(
            percentages(&updated),
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 0),
                ("c".to_string(), 50)
            ]
        );
        assert_eq!(updated.iter().map(|e| e.percentage).sum::<i32>(), 50);
    }

    #[test]
    fn unknown_id_leaves_set_unchanged() {
        let current = vec![entry("a", 60), entry("b", 40)];
        let updated = update_allocation(&current, "missing", 10);
        assert_eq!(updated, current);
    }

    #[test]
    fn single_entry_set_keeps_the_edit_verbatim() {
        let current = vec![entry("a", 100)];
        let updated = update_allocation(&current, "a", 60);
        assert_eq!(percentages(&updated), vec![("a".to_string(), 60)]);
    }

    #[test]
    fn no_entry_ever_goes_negative() {
        let current = vec![entry("a", 10), entry("b", 3), entry("c", 87)];
        let updated = update_allocation(&current, "c", 99);
        assert!(updated.iter().all(|e| e.percentage >= 0));
    }
}
