use std::sync::Arc;

use ethers::types::Address;
use tracing::{debug, warn};

use super::kv::{KvStore, StoreError};
use crate::strategy::types::Strategy;

/// Owns one wallet's strategy list, stored as a JSON array under
/// `strategies:{owner}`. Writes replace the whole document.
pub struct StrategyManager {
    store: Arc<dyn KvStore>,
    owner: Address,
}

impl StrategyManager {
    pub fn new(store: Arc<dyn KvStore>, owner: Address) -> Self {
        Self { store, owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    fn key(&self) -> String {
        format!("strategies:{:?}", self.owner)
    }

    pub async fn list(&self) -> Result<Vec<Strategy>, StoreError> {
        match self.store.get(&self.key()).await? {
            Some(document) => Ok(serde_json::from_value(document)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_all(&self, strategies: &[Strategy]) -> Result<(), StoreError> {
        let document = serde_json::to_value(strategies)?;
        self.store.set(&self.key(), document).await?;
        debug!(
            owner = ?self.owner,
            strategy_count = strategies.len(),
            "Strategy list saved"
        );
        Ok(())
    }

    /// Replaces the strategy with a matching id, or appends it.
    pub async fn upsert(&self, strategy: Strategy) -> Result<(), StoreError> {
        let mut strategies = self.list().await?;
        match strategies.iter_mut().find(|s| s.id == strategy.id) {
            Some(existing) => *existing = strategy,
            None => strategies.push(strategy),
        }
        self.save_all(&strategies).await
    }

    /// Removes a strategy by id; false when no such id was stored.
    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut strategies = self.list().await?;
        let before = strategies.len();
        strategies.retain(|s| s.id != id);
        if strategies.len() == before {
            warn!(id, "Strategy to remove was not stored");
            return Ok(false);
        }
        self.save_all(&strategies).await?;
        Ok(true)
    }

    /// Flips a strategy's active flag; false when no such id was stored.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<bool, StoreError> {
        let mut strategies = self.list().await?;
        let Some(strategy) = strategies.iter_mut().find(|s| s.id == id) else {
            warn!(id, "Strategy to toggle was not stored");
            return Ok(false);
        };
        strategy.active = active;
        self.save_all(&strategies).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::MemoryKvStore;
    use crate::strategy::types::{AllocationEntry, RebalanceFrequency, StrategyArchetype};
    use chrono::Utc;

    fn manager() -> StrategyManager {
        StrategyManager::new(Arc::new(MemoryKvStore::new()), Address::zero())
    }

    fn strategy(id: &str) -> Strategy {
        Strategy {
            id: id.to_string(),
            name: format!("Strategy {id}"),
            strategy_type: StrategyArchetype::Balanced,
            risk_level: 3,
            rebalance_frequency: RebalanceFrequency::Weekly,
            allocations: vec![AllocationEntry {
                id: "aave".to_string(),
                percentage: 100,
                apy: 4.5,
                risk_level: 2,
            }],
            estimated_apy: 4.5,
            created_at: Utc::now(),
            active: true,
        }
    }

    #[tokio::test]
    async fn fresh_owner_has_an_empty_list() {
        assert!(manager().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_appends_then_replaces() {
        let manager = manager();
        manager.upsert(strategy("s1")).await.unwrap();
        manager.upsert(strategy("s2")).await.unwrap();

        let mut renamed = strategy("s1");
        renamed.name = "Renamed".to_string();
        manager.upsert(renamed).await.unwrap();

        let strategies = manager.list().await.unwrap();
        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[0].name, "Renamed");
        assert_eq!(strategies[1].id, "s2");
    }

    #[tokio::test]
    async fn remove_reports_whether_the_id_existed() {
        let manager = manager();
        manager.upsert(strategy("s1")).await.unwrap();

        assert!(manager.remove("s1").await.unwrap());
        assert!(!manager.remove("s1").await.unwrap());
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_active_toggles_only_the_target() {
        let manager = manager();
        manager.upsert(strategy("s1")).await.unwrap();
        manager.upsert(strategy("s2")).await.unwrap();

        assert!(manager.set_active("s1", false).await.unwrap());
        assert!(!manager.set_active("missing", false).await.unwrap());

        let strategies = manager.list().await.unwrap();
        assert!(!strategies[0].active);
        assert!(strategies[1].active);
    }

    #[tokio::test]
    async fn owners_do_not_share_lists() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let first = StrategyManager::new(store.clone(), Address::zero());
        let second = StrategyManager::new(store, Address::repeat_byte(1));

        first.upsert(strategy("s1")).await.unwrap();
        assert!(second.list().await.unwrap().is_empty());
    }
}
