use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One catalog record. `risk_level` is curated data; `apy` and `tvl_usd` are
/// live figures refreshed by the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInfo {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub apy: f64,
    pub tvl_usd: Decimal,
    pub risk_level: u8,
}

/// A by-id yield figure pulled from the external API, ready to merge into
/// the catalog. Rows without an APY never make it this far.
#[derive(Debug, Clone)]
pub struct YieldUpdate {
    pub id: String,
    pub apy: f64,
    pub tvl_usd: Option<Decimal>,
}
