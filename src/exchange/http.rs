use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::exchange::MarketData;
use crate::models::{Candle, CandleSeries, IndicatorSnapshot, Timeframe};

const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);
const CANDLE_CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct CandleResponse {
    candles: Vec<RawCandle>,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    bid: Option<f64>,
    #[serde(default)]
    ask: Option<f64>,
    #[serde(default)]
    last: Option<f64>,
}

/// JSON market-data client with request pacing and a short candle cache so
/// the seconds-scale tick loop doesn't hammer the provider.
pub struct HttpMarketData {
    client: Client,
    base_url: String,
    symbol: String,
    last_request: Option<Instant>,
    cache: HashMap<String, (Instant, CandleSeries)>,
}

impl HttpMarketData {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            symbol: cfg.symbol.clone(),
            last_request: None,
            cache: HashMap::new(),
        }
    }

    async fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    fn convert(&self, raw: Vec<RawCandle>) -> CandleSeries {
        let mut candles: Vec<Candle> = raw
            .into_iter()
            .filter_map(|r| {
                DateTime::from_timestamp_millis(r.timestamp).map(|ts| Candle {
                    timestamp: ts,
                    open: r.open,
                    high: r.high,
                    low: r.low,
                    close: r.close,
                    volume: r.volume,
                })
            })
            .collect();
        candles.sort_by_key(|c| c.timestamp);
        CandleSeries::new(candles)
    }
}

#[async_trait]
impl MarketData for HttpMarketData {
    async fn fetch_ohlcv(&mut self, tf: Timeframe, limit: usize) -> Result<CandleSeries> {
        let cache_key = format!("{}_{}_{}", self.symbol, tf, limit);
        if let Some((cached_at, series)) = self.cache.get(&cache_key) {
            if cached_at.elapsed() < CANDLE_CACHE_TTL {
                return Ok(series.clone());
            }
        }

        self.rate_limit().await;

        let url = format!("{}/v1/markets/{}/candles", self.base_url, self.symbol);
        let resp = self
            .client
            .get(url)
            .query(&[
                ("granularity", tf.api_granularity().to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .context("Failed to fetch candles")?
            .error_for_status()
            .context("Candle request rejected")?;

        let body: CandleResponse = resp.json().await.context("Failed to parse candles")?;
        let series = self.convert(body.candles);
        self.cache
            .insert(cache_key, (Instant::now(), series.clone()));
        Ok(series)
    }

    async fn fetch_snapshot(&mut self) -> Result<IndicatorSnapshot> {
        self.rate_limit().await;

        let url = format!("{}/v1/markets/{}/indicators", self.base_url, self.symbol);
        let snap = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch indicator snapshot")?
            .error_for_status()
            .context("Indicator request rejected")?
            .json::<IndicatorSnapshot>()
            .await
            .context("Failed to parse indicator snapshot")?;
        Ok(snap)
    }

    async fn fetch_mark_price(&mut self) -> Result<f64> {
        self.rate_limit().await;

        let url = format!("{}/v1/markets/{}/quote", self.base_url, self.symbol);
        let quote = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch quote")?
            .error_for_status()
            .context("Quote request rejected")?
            .json::<QuoteResponse>()
            .await
            .context("Failed to parse quote")?;

        match (quote.bid, quote.ask) {
            (Some(bid), Some(ask)) if bid > 0.0 && ask > 0.0 => Ok((bid + ask) / 2.0),
            _ => quote
                .last
                .filter(|p| p.is_finite() && *p > 0.0)
                .context("Quote carried neither bid/ask nor last"),
        }
    }
}
