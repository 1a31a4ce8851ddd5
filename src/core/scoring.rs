use serde::{Deserialize, Serialize};

use crate::models::{Direction, IndicatorSignal, IndicatorSnapshot, MacdCross, Strength};

const RSI_EXTREME_POINTS: f64 = 3.0;
const RSI_STRONG_POINTS: f64 = 2.0;
const RSI_LEAN_POINTS: f64 = 1.0;
const SUPERTREND_POINTS: f64 = 2.5;
const EWO_POINTS: f64 = 2.0;
const MACD_POINTS: f64 = 3.0;

/// Outer pivot (S2/R2) proximity bonus, then inner (S1/R1).
const OUTER_PIVOT_NEAR: f64 = 4.0;
const OUTER_PIVOT_CLOSE: f64 = 3.0;
const INNER_PIVOT_NEAR: f64 = 2.5;
const INNER_PIVOT_CLOSE: f64 = 1.5;
const PIVOT_NEAR_DIST: f64 = 3.0;
const PIVOT_CLOSE_DIST: f64 = 8.0;

/// Minimum bullish/bearish separation and minimum winning total; anything
/// inside this dead zone is too ambiguous to act on.
const MIN_SCORE_DIFF: f64 = 1.5;
const MIN_TOTAL_SCORE: f64 = 3.0;

const HIGH_CUTOFF: f64 = 12.0;
const MEDIUM_CUTOFF: f64 = 7.0;

/// Directional recommendation derived fresh each tick; no carried state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalScore {
    pub bullish: f64,
    pub bearish: f64,
    pub direction: Direction,
    pub strength: Strength,
    pub reason: String,
}

/// Additive weighted heuristic over one indicator snapshot. Returns None in
/// the dead zone. Never fails: NaN readings are neutralized first.
pub fn score(snapshot: &IndicatorSnapshot) -> Option<SignalScore> {
    let snap = snapshot.sanitized();
    if !snap.current_price.is_finite() {
        return None;
    }

    let mut bullish = 0.0;
    let mut bearish = 0.0;
    let mut bull_reasons: Vec<String> = Vec::new();
    let mut bear_reasons: Vec<String> = Vec::new();

    // RSI tiers
    if snap.rsi < 30.0 {
        bullish += RSI_EXTREME_POINTS;
        bull_reasons.push(format!("RSI oversold ({:.1})", snap.rsi));
    } else if snap.rsi < 40.0 {
        bullish += RSI_STRONG_POINTS;
        bull_reasons.push(format!("RSI weak ({:.1})", snap.rsi));
    } else if snap.rsi < 45.0 {
        bullish += RSI_LEAN_POINTS;
    }
    if snap.rsi > 70.0 {
        bearish += RSI_EXTREME_POINTS;
        bear_reasons.push(format!("RSI overbought ({:.1})", snap.rsi));
    } else if snap.rsi > 60.0 {
        bearish += RSI_STRONG_POINTS;
        bear_reasons.push(format!("RSI stretched ({:.1})", snap.rsi));
    } else if snap.rsi > 55.0 {
        bearish += RSI_LEAN_POINTS;
    }

    match snap.super_trend_signal {
        IndicatorSignal::Buy => {
            bullish += SUPERTREND_POINTS;
            bull_reasons.push("SuperTrend buy".to_string());
        }
        IndicatorSignal::Sell => {
            bearish += SUPERTREND_POINTS;
            bear_reasons.push("SuperTrend sell".to_string());
        }
        IndicatorSignal::Hold => {}
    }

    match snap.ewo_signal {
        IndicatorSignal::Buy => {
            bullish += EWO_POINTS;
            bull_reasons.push("EWO rising".to_string());
        }
        IndicatorSignal::Sell => {
            bearish += EWO_POINTS;
            bear_reasons.push("EWO falling".to_string());
        }
        IndicatorSignal::Hold => {}
    }

    match snap.macd_crossover {
        MacdCross::Bullish => {
            bullish += MACD_POINTS;
            bull_reasons.push("MACD bullish cross".to_string());
        }
        MacdCross::Bearish => {
            bearish += MACD_POINTS;
            bear_reasons.push("MACD bearish cross".to_string());
        }
        MacdCross::None => {}
    }

    // Support proximity feeds the bullish side, resistance the bearish.
    if let Some((points, label)) =
        pivot_bonus(snap.current_price, snap.pivot_s2, snap.pivot_s1, "S2", "S1")
    {
        bullish += points;
        bull_reasons.push(format!("near {} support", label));
    }
    if let Some((points, label)) =
        pivot_bonus(snap.current_price, snap.pivot_r2, snap.pivot_r1, "R2", "R1")
    {
        bearish += points;
        bear_reasons.push(format!("near {} resistance", label));
    }

    // Trend multiplier scales both totals.
    let multiplier = if snap.adx >= 30.0 {
        1.8
    } else if snap.adx >= 25.0 {
        1.5
    } else if snap.adx >= 20.0 {
        1.2
    } else {
        1.0
    };
    bullish *= multiplier;
    bearish *= multiplier;

    let diff = bullish - bearish;
    let total = bullish.max(bearish);
    if diff.abs() < MIN_SCORE_DIFF || total < MIN_TOTAL_SCORE {
        return None;
    }

    let direction = if diff > 0.0 {
        Direction::Call
    } else {
        Direction::Put
    };
    let strength = if total > HIGH_CUTOFF {
        Strength::High
    } else if total > MEDIUM_CUTOFF {
        Strength::Medium
    } else {
        Strength::Low
    };

    let mut reasons = match direction {
        Direction::Call => bull_reasons,
        Direction::Put => bear_reasons,
    };
    if multiplier > 1.0 {
        reasons.push(format!("trending (ADX {:.1})", snap.adx));
    }
    let reason = if reasons.is_empty() {
        "momentum building".to_string()
    } else {
        reasons.join(" | ")
    };

    Some(SignalScore {
        bullish,
        bearish,
        direction,
        strength,
        reason,
    })
}

/// Tiered distance bonus, outer level consulted before inner.
fn pivot_bonus(
    price: f64,
    outer: f64,
    inner: f64,
    outer_name: &'static str,
    inner_name: &'static str,
) -> Option<(f64, &'static str)> {
    if outer.is_finite() {
        let d = (price - outer).abs();
        if d < PIVOT_NEAR_DIST {
            return Some((OUTER_PIVOT_NEAR, outer_name));
        }
        if d < PIVOT_CLOSE_DIST {
            return Some((OUTER_PIVOT_CLOSE, outer_name));
        }
    }
    if inner.is_finite() {
        let d = (price - inner).abs();
        if d < PIVOT_NEAR_DIST {
            return Some((INNER_PIVOT_NEAR, inner_name));
        }
        if d < PIVOT_CLOSE_DIST {
            return Some((INNER_PIVOT_CLOSE, inner_name));
        }
    }
    None
}
