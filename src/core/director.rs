use serde::{Deserialize, Serialize};

use crate::models::{CandleSeries, Regime};

const FAST_EMA: usize = 9;
const FAST_SLOW_EMA: usize = 21;
const MEDIUM_EMA: usize = 9;
const MEDIUM_SLOW_EMA: usize = 20;
const TENKAN_PERIOD: usize = 9;
const KIJUN_PERIOD: usize = 26;
const SENKOU_B_PERIOD: usize = 52;

const FAST_CROSS_POINTS: f64 = 1.0;
const FAST_LOCATION_POINTS: f64 = 0.5;
const MEDIUM_CROSS_POINTS: f64 = 1.0;
const CLOUD_POINTS: f64 = 1.5;

/// Weight the previous bias keeps each tick; the remainder comes from fresh
/// evidence. This is what stops single-bar noise from flipping the regime.
const BIAS_CARRY: f64 = 0.65;
/// A regime is only entered beyond this bias magnitude...
const ENTRY_THRESHOLD: f64 = 1.0;
/// ...and only decays to chop inside this narrower band.
const EXIT_THRESHOLD: f64 = 0.4;

/// Persistent directional bias. Each tick's recomputation seeds from the
/// previous value; the regime therefore lags raw evidence on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DirectorState {
    pub regime: Regime,
    pub bias_score: f64,
    pub inside_cloud: bool,
}

/// Recompute the director from the three series, threading the previous
/// state explicitly. Pure; callers own persistence.
pub fn compute(
    prev: &DirectorState,
    fast: &CandleSeries,
    medium: &CandleSeries,
    slow: &CandleSeries,
) -> DirectorState {
    let mut raw = 0.0;

    let fast_closes = fast.closes();
    if let (Some(short), Some(long)) = (ema(&fast_closes, FAST_EMA), ema(&fast_closes, FAST_SLOW_EMA)) {
        if short > long {
            raw += FAST_CROSS_POINTS;
        } else if short < long {
            raw -= FAST_CROSS_POINTS;
        }
        if let Some(last) = fast_closes.last() {
            if *last > long {
                raw += FAST_LOCATION_POINTS;
            } else if *last < long {
                raw -= FAST_LOCATION_POINTS;
            }
        }
    }

    let medium_closes = medium.closes();
    if let (Some(short), Some(long)) =
        (ema(&medium_closes, MEDIUM_EMA), ema(&medium_closes, MEDIUM_SLOW_EMA))
    {
        if short > long {
            raw += MEDIUM_CROSS_POINTS;
        } else if short < long {
            raw -= MEDIUM_CROSS_POINTS;
        }
    }

    let mut inside_cloud = prev.inside_cloud;
    if let Some((cloud_bottom, cloud_top)) = cloud_bounds(slow) {
        if let Some(close) = slow.last().map(|c| c.close) {
            if close > cloud_top {
                raw += CLOUD_POINTS;
                inside_cloud = false;
            } else if close < cloud_bottom {
                raw -= CLOUD_POINTS;
                inside_cloud = false;
            } else {
                inside_cloud = true;
            }
        }
    }

    let bias_score = BIAS_CARRY * prev.bias_score + (1.0 - BIAS_CARRY) * raw;

    let regime = if bias_score >= ENTRY_THRESHOLD {
        Regime::TrendUp
    } else if bias_score <= -ENTRY_THRESHOLD {
        Regime::TrendDown
    } else if bias_score.abs() < EXIT_THRESHOLD {
        Regime::Chop
    } else {
        prev.regime
    };

    DirectorState {
        regime,
        bias_score,
        inside_cloud,
    }
}

/// EMA seeded with the SMA of the first `period` values.
fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let mut avg = values[..period].iter().sum::<f64>() / period as f64;
    let alpha = 2.0 / (period as f64 + 1.0);
    for v in &values[period..] {
        avg = alpha * v + (1.0 - alpha) * avg;
    }
    Some(avg)
}

/// Midpoint of the high/low extremes over the trailing `period` bars.
fn midpoint(series: &CandleSeries, period: usize) -> Option<f64> {
    if series.len() < period {
        return None;
    }
    let window = series.tail(period);
    Some((window.highs_max() + window.lows_min()) / 2.0)
}

/// Simplified Ichimoku cloud on the slow series: span A is the tenkan/kijun
/// midpoint, span B the 52-bar midpoint. Forward displacement is dropped.
fn cloud_bounds(slow: &CandleSeries) -> Option<(f64, f64)> {
    let tenkan = midpoint(slow, TENKAN_PERIOD)?;
    let kijun = midpoint(slow, KIJUN_PERIOD)?;
    let span_a = (tenkan + kijun) / 2.0;
    let span_b = midpoint(slow, SENKOU_B_PERIOD)?;
    Some((span_a.min(span_b), span_a.max(span_b)))
}
