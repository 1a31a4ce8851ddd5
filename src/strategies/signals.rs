use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::scoring::SignalScore;
use crate::models::{Direction, IndicatorSnapshot, Strength};

const STRIKE_STEP: f64 = 5.0;
const PREMIUM_ANCHOR: f64 = 4.0;
const PREMIUM_DECAY_PER_POINT: f64 = 0.4;
const PREMIUM_BASE_FLOOR: f64 = 1.5;
const VOLATILITY_BUMP: f64 = 0.5;
const VOLATILITY_ADX_CUTOFF: f64 = 25.0;
const PREMIUM_MIN: f64 = 1.0;
const PREMIUM_MAX: f64 = 6.0;
const TARGET_MULTIPLES: [f64; 3] = [1.5, 2.0, 3.0];
const STOP_MULTIPLE: f64 = 0.5;

/// A concrete option recommendation: contract, premium estimate, targets and
/// the underlying reference levels the lifecycle tracker watches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    pub direction: Direction,
    pub strike_price: f64,
    pub entry_price: f64,
    pub estimated_premium: f64,
    pub profit_target_1: f64,
    pub profit_target_2: f64,
    pub profit_target_3: f64,
    pub stop_loss: f64,
    pub target_spx_price: f64,
    pub stop_spx_price: f64,
    pub reason: String,
    pub strength: Strength,
    pub timestamp: DateTime<Utc>,
}

/// Identity of a recommendation. Two signals with equal keys are the same
/// trade idea; re-deliveries with an unchanged key must not re-fire side
/// effects. Strikes are whole multiples of $5 so an integer field keeps the
/// comparison exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalKey {
    pub direction: Direction,
    pub strike: i64,
    pub strength: Strength,
}

impl TradeSignal {
    pub fn key(&self) -> SignalKey {
        SignalKey {
            direction: self.direction,
            strike: self.strike_price as i64,
            strength: self.strength,
        }
    }
}

/// Derive the tradeable contract from a scored snapshot. Pure and
/// deterministic for identical inputs.
pub fn plan(score: &SignalScore, snapshot: &IndicatorSnapshot, now: DateTime<Utc>) -> TradeSignal {
    let snap = snapshot.sanitized();
    let price = snap.current_price;

    let strike = match score.direction {
        Direction::Call => (price / STRIKE_STEP).ceil() * STRIKE_STEP,
        Direction::Put => (price / STRIKE_STEP).floor() * STRIKE_STEP,
    };

    let mut premium =
        PREMIUM_BASE_FLOOR.max(PREMIUM_ANCHOR - PREMIUM_DECAY_PER_POINT * (strike - price).abs());
    if snap.adx > VOLATILITY_ADX_CUTOFF {
        premium += VOLATILITY_BUMP;
    }
    let premium = premium.clamp(PREMIUM_MIN, PREMIUM_MAX);

    let (target_spx_price, stop_spx_price) = match score.direction {
        Direction::Call => (snap.pivot_r1, snap.pivot_s1),
        Direction::Put => (snap.pivot_s1, snap.pivot_r1),
    };

    TradeSignal {
        direction: score.direction,
        strike_price: strike,
        entry_price: price,
        estimated_premium: premium,
        profit_target_1: premium * TARGET_MULTIPLES[0],
        profit_target_2: premium * TARGET_MULTIPLES[1],
        profit_target_3: premium * TARGET_MULTIPLES[2],
        stop_loss: premium * STOP_MULTIPLE,
        target_spx_price,
        stop_spx_price,
        reason: score.reason.clone(),
        strength: score.strength,
        timestamp: now,
    }
}
