pub mod feed;
pub mod http;

pub use feed::{FeedError, MarketFeed};
pub use http::HttpMarketData;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CandleSeries, IndicatorSnapshot, Timeframe};

/// Upstream market-data boundary. Implementations fetch and normalize;
/// indicator computation happens on the provider side.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn fetch_ohlcv(&mut self, tf: Timeframe, limit: usize) -> Result<CandleSeries>;
    async fn fetch_snapshot(&mut self) -> Result<IndicatorSnapshot>;
    /// Mark price: bid/ask midpoint, falling back to last trade.
    async fn fetch_mark_price(&mut self) -> Result<f64>;
}
