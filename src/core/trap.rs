use serde::{Deserialize, Serialize};

use crate::models::{CandleSeries, Regime, TrapKind};

use super::director::DirectorState;

/// Bars establishing the range a breakout is judged against.
const BREAKOUT_LOOKBACK: usize = 20;
/// Most recent bars inspected for the poke-and-fail pattern.
const CONFIRM_BARS: usize = 3;
/// A detected trap stays hot for this many subsequent bars.
const TRAP_LIFETIME_BARS: u32 = 3;

/// Short-lived reversal detector output, persisted across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TrapModeResult {
    pub active: bool,
    pub kind: Option<TrapKind>,
    pub age: u32,
}

/// Evaluate whether the last few fast bars form a failed breakout against the
/// current director state, seeding from the previous result so an active trap
/// survives a few bars before expiring.
pub fn detect(prev: &TrapModeResult, director: &DirectorState, fast: &CandleSeries) -> TrapModeResult {
    if let Some(kind) = fresh_trap(director, fast) {
        return TrapModeResult {
            active: true,
            kind: Some(kind),
            age: 0,
        };
    }

    if prev.active && prev.age + 1 < TRAP_LIFETIME_BARS {
        return TrapModeResult {
            active: true,
            kind: prev.kind,
            age: prev.age + 1,
        };
    }

    TrapModeResult::default()
}

fn fresh_trap(director: &DirectorState, fast: &CandleSeries) -> Option<TrapKind> {
    if fast.len() < BREAKOUT_LOOKBACK + CONFIRM_BARS {
        return None;
    }

    let window = fast.tail(BREAKOUT_LOOKBACK + CONFIRM_BARS);
    let range = CandleSeries::new(window.as_slice()[..BREAKOUT_LOOKBACK].to_vec());
    let recent = &window.as_slice()[BREAKOUT_LOOKBACK..];
    let prior_high = range.highs_max();
    let prior_low = range.lows_min();

    let latest = recent.last()?;

    // Upside poke that closed back inside the range with a rejection wick.
    let poked_above = recent.iter().any(|c| c.high > prior_high);
    if poked_above
        && latest.close < prior_high
        && latest.upper_wick() > latest.body()
        && director.regime != Regime::TrendDown
    {
        return Some(TrapKind::BullTrap);
    }

    let poked_below = recent.iter().any(|c| c.low < prior_low);
    if poked_below
        && latest.close > prior_low
        && latest.lower_wick() > latest.body()
        && director.regime != Regime::TrendUp
    {
        return Some(TrapKind::BearTrap);
    }

    None
}
