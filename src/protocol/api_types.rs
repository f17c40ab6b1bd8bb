use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Yields API response structures

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldsResponse {
    pub data: Vec<PoolRow>,
}

/// One pool row from the listing endpoint. APY is optional on the wire;
/// rows without one are dropped before they reach the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolRow {
    pub pool: String,
    pub apy: Option<f64>,
    #[serde(rename = "tvlUsd")]
    pub tvl_usd: Option<Decimal>,
}
