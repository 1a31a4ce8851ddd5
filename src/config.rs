use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedConfig = Arc<RwLock<Config>>;

/// Runtime knobs. Algorithm constants (scoring weights, cooldown window,
/// warm-up minimums, premium bounds) are fixed in their owning modules and
/// deliberately not configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub symbol: String,
    pub api_base_url: String,

    /// Dollars available for the contracts-affordable display.
    pub budget: f64,

    /// Master switch for push/audio side effects.
    pub alerts_enabled: bool,

    // Tick loop intervals (seconds)
    pub data_refresh_secs: u64,
    pub status_log_secs: u64,

    /// Bars requested per timeframe on each refresh.
    pub data_lookback: usize,

    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        Config {
            symbol: env("SYMBOL", "SPX"),
            api_base_url: env("API_BASE_URL", "https://api.example-market-data.com"),
            budget: env("BUDGET", "1000").parse().unwrap_or(1000.0),
            alerts_enabled: env("ALERTS_ENABLED", "true").to_lowercase() == "true",
            data_refresh_secs: env("DATA_REFRESH_SECS", "5").parse().unwrap_or(5),
            status_log_secs: env("STATUS_LOG_SECS", "300").parse().unwrap_or(300),
            data_lookback: env("DATA_LOOKBACK", "120").parse().unwrap_or(120),
            log_level: env("LOG_LEVEL", "INFO").to_string(),
        }
    }

    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}
