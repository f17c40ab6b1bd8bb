use std::time::Duration;

use eyre::Result;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use tracing::{debug, instrument};
use url::Url;

use super::api_types::YieldsResponse;
use super::types::YieldUpdate;

#[derive(Debug, Clone)]
pub struct YieldsApiClient {
    http_client: ClientWithMiddleware,
    base_url: String,
}

impl YieldsApiClient {
    pub fn new(base_url: &str) -> Self {
        let reqwest_client = reqwest_middleware::reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_millis(1000))
            .build_with_max_retries(3);

        let http_client = ClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the pool listing and map it into by-id yield updates.
    #[instrument(skip(self))]
    pub async fn fetch_yields(&self) -> Result<Vec<YieldUpdate>> {
        let url = Url::parse(&format!("{}/yields", self.base_url))?;
        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let yields_response: YieldsResponse = response.json().await?;
        debug!(
            row_count = yields_response.data.len(),
            "Received yields listing"
        );
        Ok(into_updates(yields_response))
    }
}

/// Rows without an APY figure are skipped; a missing TVL is passed through
/// as None so the catalog keeps its stored figure.
fn into_updates(response: YieldsResponse) -> Vec<YieldUpdate> {
    response
        .data
        .into_iter()
        .filter_map(|row| {
            row.apy.map(|apy| YieldUpdate {
                id: row.pool,
                apy,
                tvl_usd: row.tvl_usd,
            })
        })
        .collect()
}
