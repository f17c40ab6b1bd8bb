use std::fs;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{ProtocolInfo, YieldUpdate};
use crate::store::kv::{KvStore, StoreError};

/// Store key the catalog document lives under.
pub const PROTOCOLS_KEY: &str = "protocols";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read protocol catalog file")]
    Io(#[from] std::io::Error),
    #[error("protocol catalog is not valid JSON")]
    Serde(#[from] serde_json::Error),
    #[error("protocol catalog store access failed")]
    Store(#[from] StoreError),
    #[error("protocol catalog document has no 'protocols' array")]
    MissingProtocols,
}

/// Ordered protocol catalog. Catalog order is what the suggestion generator
/// sees, so it is preserved through every load and merge.
#[derive(Debug, Default)]
pub struct ProtocolRegistry {
    protocols: Vec<ProtocolInfo>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ProtocolInfo> {
        self.protocols.iter().find(|p| p.id == id)
    }

    /// Candidate list handed to the suggestion generator.
    pub fn candidates(&self) -> &[ProtocolInfo] {
        &self.protocols
    }

    /// Loads the catalog from the seed JSON file, replacing current contents.
    pub fn load_from_file(&mut self, path: &str) -> Result<usize, CatalogError> {
        info!(file = %path, "Loading protocol catalog from file");
        let file_content = fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&file_content)?;
        self.load_document(document)
    }

    /// Loads the catalog from the store. Returns false when no document has
    /// been written yet, leaving current contents alone.
    pub async fn load_from_store(&mut self, store: &dyn KvStore) -> Result<bool, CatalogError> {
        let Some(document) = store.get(PROTOCOLS_KEY).await? else {
            debug!(key = PROTOCOLS_KEY, "No protocol catalog in store");
            return Ok(false);
        };
        self.load_document(document)?;
        Ok(true)
    }

    pub async fn save_to_store(&self, store: &dyn KvStore) -> Result<(), CatalogError> {
        let document = json!({ "protocols": self.protocols });
        store.set(PROTOCOLS_KEY, document).await?;
        debug!(
            protocol_count = self.protocols.len(),
            "Protocol catalog saved to store"
        );
        Ok(())
    }

    fn load_document(&mut self, document: Value) -> Result<usize, CatalogError> {
        let protocols = document
            .get("protocols")
            .cloned()
            .ok_or(CatalogError::MissingProtocols)?;
        self.protocols = serde_json::from_value(protocols)?;
        info!(
            loaded_count = self.protocols.len(),
            "Protocol catalog loaded"
        );
        Ok(self.protocols.len())
    }

    /// Merges live APY/TVL figures into the catalog by protocol id.
    /// Returns (updated, unknown) counts; unknown ids are logged and skipped.
    pub fn apply_yields(&mut self, updates: &[YieldUpdate]) -> (usize, usize) {
        let mut updated_count = 0;
        let mut unknown_count = 0;
        for update in updates {
            match self.protocols.iter_mut().find(|p| p.id == update.id) {
                Some(protocol) => {
                    protocol.apy = update.apy;
                    if let Some(tvl_usd) = update.tvl_usd {
                        protocol.tvl_usd = tvl_usd;
                    }
                    updated_count += 1;
                    debug!(
                        id = %protocol.id,
                        apy = protocol.apy,
                        "Protocol yield updated"
                    );
                }
                None => {
                    unknown_count += 1;
                    warn!(id = %update.id, "Yield update for unknown protocol");
                }
            }
        }
        info!(updated_count, unknown_count, "Yield updates applied");
        (updated_count, unknown_count)
    }

    /// Formatted catalog dump for the operational binaries.
    pub fn log_catalog(&self) {
        let output = self
            .protocols
            .iter()
            .map(|p| {
                format!(
                    "{} ({}): apy {:.2}% | tvl {} USD | risk {}",
                    p.name, p.symbol, p.apy, p.tvl_usd, p.risk_level
                )
            })
            .collect::<Vec<String>>()
            .join("\n");
        info!(protocols = %output, "Protocol catalog");
    }
}
