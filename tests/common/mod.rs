use chrono::{DateTime, Duration, Utc};

use spx_scalp_bot::models::{Candle, CandleSeries, IndicatorSnapshot};

/// Fixed reference instant: a Wednesday, 10:00 ET.
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
