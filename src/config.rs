use dotenvy::dotenv;
use std::env;

pub struct Config {
    pub redis_url: String,
    pub wallet_address: Option<String>,
    pub protocols_file: String,
    pub yields_api_url: Option<String>,
    pub refresh_interval_mins: i64,
    pub collect_interval_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        dotenv().ok();

        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://redis:6379".to_string());

        // Only the strategy-facing binaries need a wallet; the collector and
        // seeding utilities run without one.
        let wallet_address = env::var("WALLET_ADDRESS").ok();

        let protocols_file =
            env::var("PROTOCOLS_FILE").unwrap_or_else(|_| "data/protocols.json".to_string());

        let yields_api_url = env::var("YIELDS_API_URL").ok();

        let refresh_interval_mins = env::var("REFRESH_INTERVAL_MINS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let collect_interval_secs = env::var("COLLECT_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        Config {
            redis_url,
            wallet_address,
            protocols_file,
            yields_api_url,
            refresh_interval_mins,
            collect_interval_secs,
        }
    }
}
