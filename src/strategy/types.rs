use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{allocator, metrics};
use crate::protocol::types::ProtocolInfo;

/// Strategy archetype, deciding how suggested allocations are filtered and
/// how strongly they are front-loaded into the top pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyArchetype {
    Conservative,
    Balanced,
    Aggressive,
}

impl StrategyArchetype {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "conservative" => Some(Self::Conservative),
            "balanced" => Some(Self::Balanced),
            "aggressive" => Some(Self::Aggressive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
        }
    }

    /// Percentage handed to the first suggested protocol.
    pub fn front_load(&self) -> i32 {
        match self {
            Self::Conservative => super::strategy_constants::CONSERVATIVE_FRONT_LOAD,
            Self::Balanced => super::strategy_constants::BALANCED_FRONT_LOAD,
            Self::Aggressive => super::strategy_constants::AGGRESSIVE_FRONT_LOAD,
        }
    }
}

impl Default for StrategyArchetype {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl RebalanceFrequency {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn interval(&self) -> Duration {
        match self {
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::weeks(1),
            Self::Monthly => Duration::days(30),
        }
    }

    pub fn is_due(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last) >= self.interval()
    }
}

impl Default for RebalanceFrequency {
    fn default() -> Self {
        Self::Weekly
    }
}

/// One protocol's share of a strategy's capital. APY and risk level are
/// carried from the protocol catalog at allocation time and never computed
/// here. The percentage is signed so the generator's residual correction
/// stays representable in its documented pathological case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationEntry {
    pub id: String,
    pub percentage: i32,
    pub apy: f64,
    pub risk_level: u8,
}

/// Ordered allocation entries plus the `custom` flag that suppresses
/// archetype-driven regeneration once the user has edited a percentage
/// by hand.
#[derive(Debug, Clone, Default)]
pub struct AllocationSet {
    entries: Vec<AllocationEntry>,
    custom: bool,
}

impl AllocationSet {
    pub fn suggest(
        strategy_type: StrategyArchetype,
        risk_tolerance: u8,
        candidates: &[ProtocolInfo],
    ) -> Self {
        Self {
            entries: allocator::generate_suggested_allocations(
                strategy_type,
                risk_tolerance,
                candidates,
            ),
            custom: false,
        }
    }

    pub fn from_entries(entries: Vec<AllocationEntry>, custom: bool) -> Self {
        Self { entries, custom }
    }

    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<AllocationEntry> {
        self.entries
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_percentage(&self) -> i32 {
        self.entries.iter().map(|e| e.percentage).sum()
    }

    /// Applies a manual percentage edit and rebalances the other entries.
    /// Marks the set custom, which is what pins it against regeneration.
    pub fn apply_edit(&mut self, id: &str, percentage: i32) {
        self.entries = allocator::update_allocation(&self.entries, id, percentage);
        self.custom = true;
    }

    /// Regenerates the suggestion wholesale, discarding manual edits.
    pub fn reset(
        &mut self,
        strategy_type: StrategyArchetype,
        risk_tolerance: u8,
        candidates: &[ProtocolInfo],
    ) {
        *self = Self::suggest(strategy_type, risk_tolerance, candidates);
    }

    pub fn estimated_apy(&self) -> f64 {
        metrics::compute_estimated_apy(&self.entries)
    }

    pub fn estimated_risk(&self) -> u8 {
        metrics::compute_estimated_risk(&self.entries)
    }
}

/// A saved strategy. Serialized as camelCase JSON so stored documents match
/// what the dashboard wrote to its key-value storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub strategy_type: StrategyArchetype,
    pub risk_level: u8,
    pub rebalance_frequency: RebalanceFrequency,
    pub allocations: Vec<AllocationEntry>,
    pub estimated_apy: f64,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl Strategy {
    /// Whether this strategy is owed a rebalance, measured from the last
    /// completed refresh (or creation, if it has never been refreshed).
    pub fn rebalance_due(&self, last_refresh: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        self.active
            && self
                .rebalance_frequency
                .is_due(last_refresh.unwrap_or(self.created_at), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, apy: f64, risk_level: u8) -> ProtocolInfo {
        ProtocolInfo {
            id: id.to_string(),
            name: id.to_string(),
            symbol: id.to_uppercase(),
            apy,
            tvl_usd: rust_decimal::Decimal::ZERO,
            risk_level,
        }
    }

    #[test]
    fn archetype_string_round_trip() {
        for archetype in [
            StrategyArchetype::Conservative,
            StrategyArchetype::Balanced,
            StrategyArchetype::Aggressive,
        ] {
            assert_eq!(StrategyArchetype::from_str(archetype.as_str()), Some(archetype));
        }
        assert_eq!(StrategyArchetype::from_str("Balanced"), Some(StrategyArchetype::Balanced));
        assert_eq!(StrategyArchetype::from_str("degen"), None);
    }

    #[test]
    fn frequency_string_round_trip() {
        for frequency in [
            RebalanceFrequency::Daily,
            RebalanceFrequency::Weekly,
            RebalanceFrequency::Monthly,
        ] {
            assert_eq!(RebalanceFrequency::from_str(frequency.as_str()), Some(frequency));
        }
        assert_eq!(RebalanceFrequency::from_str("hourly"), None);
    }

    #[test]
    fn frequency_is_due_at_interval_boundary() {
        let last = Utc::now();
        let frequency = RebalanceFrequency::Daily;
        assert!(!frequency.is_due(last, last + Duration::hours(23)));
        assert!(frequency.is_due(last, last + Duration::days(1)));
        assert!(frequency.is_due(last, last + Duration::days(3)));
    }

    #[test]
    fn manual_edit_marks_set_custom() {
        let candidates = vec![candidate("aave", 5.0, 2), candidate("curve", 8.0, 3)];
        let mut set = AllocationSet::suggest(StrategyArchetype::Balanced, 3, &candidates);
        assert!(!set.is_custom());

        set.apply_edit("aave", 70);
        assert!(set.is_custom());

        set.reset(StrategyArchetype::Balanced, 3, &candidates);
        assert!(!set.is_custom());
        assert_eq!(set.total_percentage(), 100);
    }

    #[test]
    fn strategy_serializes_with_front_end_field_names() {
        let strategy = Strategy {
            id: "strat_1".to_string(),
            name: "Steady".to_string(),
            strategy_type: StrategyArchetype::Conservative,
            risk_level: 2,
            rebalance_frequency: RebalanceFrequency::Weekly,
            allocations: vec![AllocationEntry {
                id: "aave".to_string(),
                percentage: 100,
                apy: 4.2,
                risk_level: 2,
            }],
            estimated_apy: 4.2,
            created_at: Utc::now(),
            active: true,
        };

        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["type"], "conservative");
        assert_eq!(json["rebalanceFrequency"], "weekly");
        assert_eq!(json["riskLevel"], 2);
        assert_eq!(json["allocations"][0]["riskLevel"], 2);
        assert_eq!(json["estimatedApy"], 4.2);

        let back: Strategy = serde_json::from_value(json).unwrap();
        assert_eq!(back, strategy);
    }
}
