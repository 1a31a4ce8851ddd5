use serde::{Deserialize, Serialize};

use crate::models::{IndicatorSignal, MacdCross};

/// Per-tick bundle of price plus indicator readings, computed upstream and
/// treated as an opaque input here. Field spellings follow the provider's
/// wire format; missing directional fields default to HOLD/NONE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub current_price: f64,
    #[serde(default = "default_rsi")]
    pub rsi: f64,
    #[serde(default)]
    pub adx: f64,
    #[serde(default)]
    pub super_trend_signal: IndicatorSignal,
    #[serde(default)]
    pub ewo_signal: IndicatorSignal,
    #[serde(default)]
    pub macd_crossover: MacdCross,
    #[serde(default = "default_nan")]
    pub pivot_r1: f64,
    #[serde(default = "default_nan")]
    pub pivot_r2: f64,
    #[serde(default = "default_nan")]
    pub pivot_s1: f64,
    #[serde(default = "default_nan")]
    pub pivot_s2: f64,
}

fn default_rsi() -> f64 {
    50.0
}

fn default_nan() -> f64 {
    f64::NAN
}

impl IndicatorSnapshot {
    /// Substitute neutral defaults for NaN oscillator readings. Pivot levels
    /// stay as-is: a non-finite pivot simply never wins a proximity bonus.
    pub fn sanitized(&self) -> IndicatorSnapshot {
        let mut snap = self.clone();
        if !snap.rsi.is_finite() {
            snap.rsi = 50.0;
        }
        if !snap.adx.is_finite() {
            snap.adx = 0.0;
        }
        snap
    }
}
