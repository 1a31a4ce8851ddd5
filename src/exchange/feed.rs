use std::collections::HashMap;

use anyhow::Result;
use thiserror::Error;
use tracing::debug;

use crate::exchange::MarketData;
use crate::models::{CandleSeries, IndicatorSnapshot, Timeframe};

const FEED_TIMEFRAMES: [Timeframe; 3] = [Timeframe::M1, Timeframe::M5, Timeframe::M15];

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("fetch generation {got} superseded (current {current})")]
    StaleGeneration { got: u64, current: u64 },
}

/// Tags an in-flight round of fetches with the feed generation that issued
/// it. Commits from a superseded ticket are rejected wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// Latest-request-wins cache between the data source and the engine. An
/// instrument switch bumps the generation; results from a fetch started
/// before the switch can then no longer be applied, so the engine never sees
/// a partial mix of old- and new-instrument data.
pub struct MarketFeed {
    source: Box<dyn MarketData>,
    generation: u64,
    candles: HashMap<Timeframe, CandleSeries>,
    snapshot: Option<IndicatorSnapshot>,
    mark_price: Option<f64>,
}

impl MarketFeed {
    pub fn new(source: Box<dyn MarketData>) -> Self {
        Self {
            source,
            generation: 0,
            candles: HashMap::new(),
            snapshot: None,
            mark_price: None,
        }
    }

    pub fn ticket(&self) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Supersede all in-flight fetches and drop cached data, e.g. when the
    /// tracked instrument changes.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.candles.clear();
        self.snapshot = None;
        self.mark_price = None;
    }

    fn check(&self, ticket: &FetchTicket) -> Result<(), FeedError> {
        if ticket.generation != self.generation {
            return Err(FeedError::StaleGeneration {
                got: ticket.generation,
                current: self.generation,
            });
        }
        Ok(())
    }

    pub fn commit_candles(
        &mut self,
        ticket: &FetchTicket,
        tf: Timeframe,
        series: CandleSeries,
    ) -> Result<(), FeedError> {
        self.check(ticket)?;
        self.candles.insert(tf, series);
        Ok(())
    }

    pub fn commit_snapshot(
        &mut self,
        ticket: &FetchTicket,
        snapshot: IndicatorSnapshot,
    ) -> Result<(), FeedError> {
        self.check(ticket)?;
        self.snapshot = Some(snapshot);
        Ok(())
    }

    pub fn commit_mark_price(&mut self, ticket: &FetchTicket, price: f64) -> Result<(), FeedError> {
        self.check(ticket)?;
        self.mark_price = Some(price);
        Ok(())
    }

    pub fn candles(&self, tf: Timeframe) -> Option<&CandleSeries> {
        self.candles.get(&tf)
    }

    pub fn snapshot(&self) -> Option<&IndicatorSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn mark_price(&self) -> Option<f64> {
        self.mark_price
    }

    /// One full refresh round: candles for every engine timeframe plus the
    /// indicator snapshot and mark price. Individual fetch failures are
    /// logged and skipped; a stale ticket abandons the round silently.
    pub async fn refresh(&mut self, lookback: usize) -> Result<()> {
        let ticket = self.ticket();

        for tf in FEED_TIMEFRAMES {
            let fetched = self.source.fetch_ohlcv(tf, lookback).await;
            match fetched {
                Ok(series) => {
                    if self.commit_candles(&ticket, tf, series).is_err() {
                        return Ok(());
                    }
                }
                Err(e) => debug!("candle refresh {}: {}", tf, e),
            }
        }

        let fetched = self.source.fetch_snapshot().await;
        match fetched {
            Ok(snap) => {
                if self.commit_snapshot(&ticket, snap).is_err() {
                    return Ok(());
                }
            }
            Err(e) => debug!("snapshot refresh: {}", e),
        }

        let fetched = self.source.fetch_mark_price().await;
        match fetched {
            Ok(price) => {
                if self.commit_mark_price(&ticket, price).is_err() {
                    return Ok(());
                }
            }
            Err(e) => debug!("quote refresh: {}", e),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_bullish_trend, neutral_snapshot};
    use async_trait::async_trait;

    struct StaticSource;

    #[async_trait]
    impl MarketData for StaticSource {
        async fn fetch_ohlcv(&mut self, _tf: Timeframe, limit: usize) -> Result<CandleSeries> {
            Ok(make_bullish_trend(limit, 5000.0))
        }

        async fn fetch_snapshot(&mut self) -> Result<IndicatorSnapshot> {
            Ok(neutral_snapshot(5000.0))
        }

        async fn fetch_mark_price(&mut self) -> Result<f64> {
            Ok(5001.25)
        }
    }

    #[test]
    fn stale_ticket_commit_is_rejected() {
        let mut feed = MarketFeed::new(Box::new(StaticSource));
        let ticket = feed.ticket();
        feed.invalidate();

        let err = feed
            .commit_candles(&ticket, Timeframe::M1, make_bullish_trend(5, 5000.0))
            .unwrap_err();
        assert!(matches!(err, FeedError::StaleGeneration { got: 0, current: 1 }));
        assert!(feed.candles(Timeframe::M1).is_none());

        // A fresh ticket from the new generation commits fine.
        let ticket = feed.ticket();
        feed.commit_mark_price(&ticket, 5001.0).unwrap();
        assert_eq!(feed.mark_price(), Some(5001.0));
    }

    #[test]
    fn invalidate_drops_cached_data() {
        let mut feed = MarketFeed::new(Box::new(StaticSource));
        let ticket = feed.ticket();
        feed.commit_snapshot(&ticket, neutral_snapshot(5000.0)).unwrap();
        assert!(feed.snapshot().is_some());

        feed.invalidate();
        assert!(feed.snapshot().is_none());
        assert!(feed.mark_price().is_none());
    }

    #[tokio::test]
    async fn refresh_populates_all_slots() {
        let mut feed = MarketFeed::new(Box::new(StaticSource));
        feed.refresh(60).await.unwrap();

        assert_eq!(feed.candles(Timeframe::M1).unwrap().len(), 60);
        assert_eq!(feed.candles(Timeframe::M5).unwrap().len(), 60);
        assert_eq!(feed.candles(Timeframe::M15).unwrap().len(), 60);
        assert!(feed.snapshot().is_some());
        assert_eq!(feed.mark_price(), Some(5001.25));
    }
}
