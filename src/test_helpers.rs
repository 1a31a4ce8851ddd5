use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::models::{Candle, CandleSeries, IndicatorSnapshot};

/// Fixed reference instant for tests: a Wednesday, 10:00 ET.
pub fn test_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-17T15:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Create candles from (open, high, low, close) tuples with auto-incrementing
/// 1m timestamps.
pub fn make_candles(data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let base = test_now() - Duration::minutes(data.len() as i64);
    let candles: Vec<Candle> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle {
            timestamp: base + Duration::minutes(i as i64),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect();
    CandleSeries::new(candles)
}

/// n rising candles starting from `start`.
pub fn make_bullish_trend(n: usize, start: f64) -> CandleSeries {
    let data: Vec<(f64, f64, f64, f64)> = (0..n)
        .map(|i| {
            let open = start + i as f64 * 10.0;
            let close = open + 8.0;
            (open, close + 2.0, open - 1.0, close)
        })
        .collect();
    make_candles(&data)
}

/// n falling candles starting from `start`.
pub fn make_bearish_trend(n: usize, start: f64) -> CandleSeries {
    let data: Vec<(f64, f64, f64, f64)> = (0..n)
        .map(|i| {
            let open = start - i as f64 * 10.0;
            let close = open - 8.0;
            (open, open + 1.0, close - 2.0, close)
        })
        .collect();
    make_candles(&data)
}

/// n sideways candles trading a one-point band around `price`.
pub fn make_flat_series(n: usize, price: f64) -> CandleSeries {
    let data: Vec<(f64, f64, f64, f64)> =
        (0..n).map(|_| (price, price + 1.0, price - 1.0, price)).collect();
    make_candles(&data)
}

/// Snapshot with every indicator at its neutral default and no pivots.
pub fn neutral_snapshot(price: f64) -> IndicatorSnapshot {
    IndicatorSnapshot {
        current_price: price,
        rsi: 50.0,
        adx: 0.0,
        super_trend_signal: Default::default(),
        ewo_signal: Default::default(),
        macd_crossover: Default::default(),
        pivot_r1: f64::NAN,
        pivot_r2: f64::NAN,
        pivot_s1: f64::NAN,
        pivot_s2: f64::NAN,
    }
}

/// Config for tests: no provider needed, quiet logging.
pub fn default_test_config() -> Config {
    Config {
        symbol: "SPX".to_string(),
        api_base_url: "http://127.0.0.1:0".to_string(),
        budget: 1000.0,
        alerts_enabled: true,
        data_refresh_secs: 5,
        status_log_secs: 300,
        data_lookback: 120,
        log_level: "ERROR".to_string(),
    }
}
