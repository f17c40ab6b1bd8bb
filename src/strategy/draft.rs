use chrono::Utc;
use rand::RngCore;
use thiserror::Error;
use tracing::debug;

use super::types::{AllocationSet, RebalanceFrequency, Strategy, StrategyArchetype};
use crate::protocol::types::ProtocolInfo;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("strategy name is required")]
    MissingName,
    #[error("strategy has no allocations")]
    EmptyAllocations,
}

/// The builder steps a strategy moves through before it is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStep {
    Basics,
    Allocations,
    Review,
}

/// In-progress strategy state, owned by whichever flow is editing it.
/// Archetype and risk-tolerance changes regenerate the allocation set
/// wholesale unless the user has edited a percentage by hand, in which case
/// the set stays pinned until `reset_allocations`.
#[derive(Debug, Clone)]
pub struct StrategyDraft {
    name: String,
    archetype: StrategyArchetype,
    risk_tolerance: u8,
    frequency: RebalanceFrequency,
    allocations: AllocationSet,
    step: DraftStep,
}

impl StrategyDraft {
    pub fn new(candidates: &[ProtocolInfo]) -> Self {
        let archetype = StrategyArchetype::default();
        let risk_tolerance = 3;
        Self {
            name: String::new(),
            archetype,
            risk_tolerance,
            frequency: RebalanceFrequency::default(),
            allocations: AllocationSet::suggest(archetype, risk_tolerance, candidates),
            step: DraftStep::Basics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archetype(&self) -> StrategyArchetype {
        self.archetype
    }

    pub fn risk_tolerance(&self) -> u8 {
        self.risk_tolerance
    }

    pub fn frequency(&self) -> RebalanceFrequency {
        self.frequency
    }

    pub fn allocations(&self) -> &AllocationSet {
        &self.allocations
    }

    pub fn step(&self) -> DraftStep {
        self.step
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.trim().to_string();
    }

    pub fn set_frequency(&mut self, frequency: RebalanceFrequency) {
        self.frequency = frequency;
    }

    pub fn set_archetype(&mut self, archetype: StrategyArchetype, candidates: &[ProtocolInfo]) {
        self.archetype = archetype;
        self.regenerate(candidates);
    }

    pub fn set_risk_tolerance(&mut self, risk_tolerance: u8, candidates: &[ProtocolInfo]) {
        self.risk_tolerance = risk_tolerance.clamp(1, 5);
        self.regenerate(candidates);
    }

    /// Manual percentage edit; pins the set against regeneration.
    pub fn edit_allocation(&mut self, id: &str, percentage: i32) {
        self.allocations.apply_edit(id, percentage.clamp(0, 100));
    }

    /// Discards manual edits and regenerates the suggestion.
    pub fn reset_allocations(&mut self, candidates: &[ProtocolInfo]) {
        self.allocations
            .reset(self.archetype, self.risk_tolerance, candidates);
    }

    fn regenerate(&mut self, candidates: &[ProtocolInfo]) {
        if self.allocations.is_custom() {
            debug!(
                archetype = %self.archetype.as_str(),
                risk_tolerance = self.risk_tolerance,
                "Allocation set is custom; regeneration suppressed"
            );
            return;
        }
        self.allocations = AllocationSet::suggest(self.archetype, self.risk_tolerance, candidates);
    }

    /// Moves to the next step, validating the current one.
    pub fn advance(&mut self) -> Result<DraftStep, DraftError> {
        match self.step {
            DraftStep::Basics => {
                if self.name.is_empty() {
                    return Err(DraftError::MissingName);
                }
                self.step = DraftStep::Allocations;
            }
            DraftStep::Allocations => {
                if self.allocations.is_empty() {
                    return Err(DraftError::EmptyAllocations);
                }
                self.step = DraftStep::Review;
            }
            DraftStep::Review => {}
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> DraftStep {
        self.step = match self.step {
            DraftStep::Basics | DraftStep::Allocations => DraftStep::Basics,
            DraftStep::Review => DraftStep::Allocations,
        };
        self.step
    }

    /// Emits the saved strategy with a fresh id and creation timestamp.
    pub fn finalize(&self) -> Result<Strategy, DraftError> {
        if self.name.is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.allocations.is_empty() {
            return Err(DraftError::EmptyAllocations);
        }

        let estimated_apy = self.allocations.estimated_apy();
        Ok(Strategy {
            id: new_strategy_id(),
            name: self.name.clone(),
            strategy_type: self.archetype,
            risk_level: self.risk_tolerance,
            rebalance_frequency: self.frequency,
            allocations: self.allocations.clone().into_entries(),
            estimated_apy,
            created_at: Utc::now(),
            active: true,
        })
    }
}

fn new_strategy_id() -> String {
    let mut bytes = [0u8; 8];
    rand::rng().fill_bytes(&mut bytes);
    format!("strat_{}", hex::encode(bytes))
}
