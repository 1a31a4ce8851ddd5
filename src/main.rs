mod bot;

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use spx_scalp_bot::config::Config;
use spx_scalp_bot::exchange::HttpMarketData;

use crate::bot::ScalpBot;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let source = Box::new(HttpMarketData::new(&cfg));
    let shared_config = cfg.shared();

    let mut bot = ScalpBot::new(shared_config, source).await;
    bot.run().await?;

    Ok(())
}
