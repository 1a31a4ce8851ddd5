use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alerts::ScalpAlert;
use crate::core::director::{self, DirectorState};
use crate::core::trap::{self, TrapModeResult};
use crate::models::{CandleSeries, Direction, Regime, Strength, Timeframe};

/// Minimum spacing between alerts; relaxed for opposite-direction alerts by
/// a qualifying retest.
const COOLDOWN_SECS: i64 = 300;
/// Director bias magnitude required before a trend alert is proposed.
const ALERT_BIAS_MIN: f64 = 1.5;
/// Bias magnitude at which a trend alert is high confidence.
const HIGH_CONFIDENCE_BIAS: f64 = 2.5;
/// Bars that must elapse after an alert before a revisit counts as a retest.
const RETEST_MIN_BARS: u64 = 2;

/// Ledger gating alert emission. Mutated only by the engine's tick handler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AlertCooldownState {
    pub last_direction: Option<Direction>,
    pub last_alert_at: Option<DateTime<Utc>>,
    pub retest_since_last: bool,
    pub same_direction_blocked: bool,
}

/// Multi-timeframe scalp engine: persistent director bias, trap-mode
/// reversal detection, and a cooldown ledger that decides when an alert may
/// actually fire. One instance per tracked instrument; all state is owned
/// here and mutated only by `on_tick`.
pub struct ScalpEngine {
    director: DirectorState,
    trap: TrapModeResult,
    cooldown: AlertCooldownState,
    last_processed: Option<DateTime<Utc>>,
    candle_index: u64,
    last_alert_price: Option<f64>,
    last_alert_index: Option<u64>,
}

impl Default for ScalpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalpEngine {
    pub fn new() -> Self {
        Self {
            director: DirectorState::default(),
            trap: TrapModeResult::default(),
            cooldown: AlertCooldownState::default(),
            last_processed: None,
            candle_index: 0,
            last_alert_price: None,
            last_alert_index: None,
        }
    }

    pub fn director(&self) -> &DirectorState {
        &self.director
    }

    pub fn trap_mode(&self) -> &TrapModeResult {
        &self.trap
    }

    pub fn cooldown(&self) -> &AlertCooldownState {
        &self.cooldown
    }

    /// Process one delivery of the three candle series. Returns an alert
    /// when the director/trap condition is tradable and the cooldown ledger
    /// admits it. Under-warmed series and duplicate deliveries of the same
    /// latest bar leave every piece of state untouched.
    pub fn on_tick(
        &mut self,
        fast: &CandleSeries,
        medium: &CandleSeries,
        slow: &CandleSeries,
        now: DateTime<Utc>,
        push_allowed: bool,
    ) -> Option<ScalpAlert> {
        if fast.len() < Timeframe::M1.warmup_bars()
            || medium.len() < Timeframe::M5.warmup_bars()
            || slow.len() < Timeframe::M15.warmup_bars()
        {
            return None;
        }

        let latest = fast.last()?;
        if self.last_processed == Some(latest.timestamp) {
            return None;
        }

        self.director = director::compute(&self.director, fast, medium, slow);
        self.trap = trap::detect(&self.trap, &self.director, fast);

        // Retest watch: has price revisited the last alert's reference level?
        if !self.cooldown.retest_since_last {
            if let (Some(level), Some(fired_at)) = (self.last_alert_price, self.last_alert_index) {
                if self.candle_index >= fired_at + RETEST_MIN_BARS && latest.straddles(level) {
                    self.cooldown.retest_since_last = true;
                    debug!("retest of {:.2} observed", level);
                }
            }
        }

        let alert = self
            .propose(latest.close)
            .and_then(|(direction, confidence, explanation)| {
                self.gate(direction, now).then(|| {
                    self.cooldown.last_direction = Some(direction);
                    self.cooldown.last_alert_at = Some(now);
                    self.cooldown.retest_since_last = false;
                    self.cooldown.same_direction_blocked = false;
                    self.last_alert_price = Some(latest.close);
                    self.last_alert_index = Some(self.candle_index);
                    ScalpAlert {
                        direction,
                        explanation,
                        confidence,
                        should_push: confidence == Strength::High && push_allowed,
                        timestamp: now,
                    }
                })
            });

        self.last_processed = Some(latest.timestamp);
        self.candle_index += 1;
        alert
    }

    /// Candidate alert from the current director/trap picture. A fresh trap
    /// outranks trend continuation.
    fn propose(&self, close: f64) -> Option<(Direction, Strength, String)> {
        if self.trap.active && self.trap.age == 0 {
            let kind = self.trap.kind?;
            let direction = kind.reversal_direction();
            return Some((
                direction,
                Strength::High,
                format!("{} at {:.2}: failed breakout reversal", kind, close),
            ));
        }

        let bias = self.director.bias_score;
        let direction = match self.director.regime {
            Regime::TrendUp if bias >= ALERT_BIAS_MIN => Direction::Call,
            Regime::TrendDown if bias <= -ALERT_BIAS_MIN => Direction::Put,
            _ => return None,
        };
        if self.director.inside_cloud {
            return None;
        }
        let confidence = if bias.abs() >= HIGH_CONFIDENCE_BIAS {
            Strength::High
        } else {
            Strength::Medium
        };
        Some((
            direction,
            confidence,
            format!(
                "{} continuation at {:.2} (bias {:+.2})",
                self.director.regime, close, bias
            ),
        ))
    }

    /// Cooldown ledger decision. Same direction inside the window is always
    /// suppressed; the opposite direction needs a retest to punch through.
    fn gate(&mut self, direction: Direction, now: DateTime<Utc>) -> bool {
        let (last_direction, last_at) = match (self.cooldown.last_direction, self.cooldown.last_alert_at)
        {
            (Some(d), Some(t)) => (d, t),
            _ => return true,
        };
        if now - last_at >= Duration::seconds(COOLDOWN_SECS) {
            return true;
        }
        if direction == last_direction {
            self.cooldown.same_direction_blocked = true;
            debug!("{} suppressed: same-direction cooldown", direction);
            return false;
        }
        if !self.cooldown.retest_since_last {
            debug!("{} suppressed: no retest since last alert", direction);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trap::TrapModeResult;
    use crate::test_helpers::{make_bullish_trend, make_flat_series, test_now};

    fn prefix(series: &CandleSeries, n: usize) -> CandleSeries {
        CandleSeries::new(series.as_slice()[..n].to_vec())
    }

    /// Drive the engine over successively longer prefixes of a series until
    /// it emits, one minute of wall time per bar.
    fn run_until_alert(
        engine: &mut ScalpEngine,
        fast: &CandleSeries,
        medium: &CandleSeries,
        slow: &CandleSeries,
        from: usize,
    ) -> Option<(ScalpAlert, usize)> {
        for n in from..=fast.len() {
            let now = test_now() + Duration::minutes(n as i64);
            if let Some(alert) =
                engine.on_tick(&prefix(fast, n), medium, slow, now, true)
            {
                return Some((alert, n));
            }
        }
        None
    }

    #[test]
    fn under_warmed_series_is_a_no_op() {
        let mut engine = ScalpEngine::new();
        let fast = make_bullish_trend(29, 5000.0);
        let medium = make_bullish_trend(20, 5000.0);
        let slow = make_bullish_trend(52, 4900.0);

        let before_director = *engine.director();
        let before_cooldown = *engine.cooldown();
        let alert = engine.on_tick(&fast, &medium, &slow, test_now(), true);

        assert!(alert.is_none());
        assert_eq!(*engine.director(), before_director);
        assert_eq!(*engine.trap_mode(), TrapModeResult::default());
        assert_eq!(*engine.cooldown(), before_cooldown);
        assert_eq!(engine.candle_index, 0);
    }

    #[test]
    fn duplicate_latest_bar_is_a_no_op() {
        let mut engine = ScalpEngine::new();
        let fast = make_bullish_trend(60, 5000.0);
        let medium = make_bullish_trend(30, 5000.0);
        let slow = make_bullish_trend(60, 4900.0);

        engine.on_tick(&fast, &medium, &slow, test_now(), true);
        let director = *engine.director();
        let index = engine.candle_index;

        let alert = engine.on_tick(
            &fast,
            &medium,
            &slow,
            test_now() + Duration::seconds(5),
            true,
        );
        assert!(alert.is_none());
        assert_eq!(*engine.director(), director);
        assert_eq!(engine.candle_index, index);
    }

    #[test]
    fn sustained_trend_emits_call_alert() {
        let mut engine = ScalpEngine::new();
        let fast = make_bullish_trend(70, 5000.0);
        let medium = make_bullish_trend(30, 5000.0);
        let slow = make_bullish_trend(60, 4900.0);

        let (alert, _) =
            run_until_alert(&mut engine, &fast, &medium, &slow, 60).expect("alert");
        assert_eq!(alert.direction, Direction::Call);
        assert!(alert.explanation.contains("continuation"));
        assert_eq!(engine.cooldown().last_direction, Some(Direction::Call));
        assert!(!engine.cooldown().retest_since_last);
    }

    #[test]
    fn same_direction_suppressed_within_window() {
        let mut engine = ScalpEngine::new();
        let fast = make_bullish_trend(70, 5000.0);
        let medium = make_bullish_trend(30, 5000.0);
        let slow = make_bullish_trend(60, 4900.0);

        let (_, at) = run_until_alert(&mut engine, &fast, &medium, &slow, 60).expect("alert");
        // Next bar, ~1 minute later: same CALL condition, inside the window.
        let next = engine.on_tick(
            &prefix(&fast, at + 1),
            &medium,
            &slow,
            test_now() + Duration::minutes(at as i64 + 1),
            true,
        );
        assert!(next.is_none());
        assert!(engine.cooldown().same_direction_blocked);
    }

    #[test]
    fn same_direction_allowed_after_window() {
        let mut engine = ScalpEngine::new();
        let fast = make_bullish_trend(70, 5000.0);
        let medium = make_bullish_trend(30, 5000.0);
        let slow = make_bullish_trend(60, 4900.0);

        let (_, at) = run_until_alert(&mut engine, &fast, &medium, &slow, 60).expect("alert");
        let later = test_now() + Duration::minutes(at as i64) + Duration::seconds(COOLDOWN_SECS);
        let next = engine.on_tick(&prefix(&fast, at + 1), &medium, &slow, later, true);
        assert!(next.is_some());
    }

    #[test]
    fn opposite_direction_needs_retest() {
        let mut engine = ScalpEngine::new();
        engine.cooldown.last_direction = Some(Direction::Call);
        engine.cooldown.last_alert_at = Some(test_now());

        let inside = test_now() + Duration::seconds(COOLDOWN_SECS / 2);
        assert!(!engine.gate(Direction::Put, inside));

        engine.cooldown.retest_since_last = true;
        assert!(engine.gate(Direction::Put, inside));
    }

    #[test]
    fn emission_resets_the_ledger() {
        let mut engine = ScalpEngine::new();
        let fast = make_bullish_trend(70, 5000.0);
        let medium = make_bullish_trend(30, 5000.0);
        let slow = make_bullish_trend(60, 4900.0);

        // Pretend a PUT fired recently and a retest already occurred.
        engine.cooldown.last_direction = Some(Direction::Put);
        engine.cooldown.last_alert_at = Some(test_now() + Duration::minutes(59));
        engine.cooldown.retest_since_last = true;

        let (alert, at) =
            run_until_alert(&mut engine, &fast, &medium, &slow, 60).expect("alert");
        assert_eq!(alert.direction, Direction::Call);
        let cd = engine.cooldown();
        assert_eq!(cd.last_direction, Some(Direction::Call));
        assert_eq!(cd.last_alert_at, Some(test_now() + Duration::minutes(at as i64)));
        assert!(!cd.retest_since_last);
    }

    #[test]
    fn retest_flag_set_when_price_revisits_level() {
        let mut engine = ScalpEngine::new();
        let medium = make_flat_series(30, 5000.0);
        let slow = make_flat_series(60, 5000.0);
        let fast = make_flat_series(40, 5000.0);

        // Simulate an alert three bars ago at a level the flat tape straddles.
        engine.cooldown.last_direction = Some(Direction::Call);
        engine.cooldown.last_alert_at = Some(test_now());
        engine.last_alert_price = Some(5000.5);
        engine.last_alert_index = Some(0);
        engine.candle_index = 3;

        engine.on_tick(&fast, &medium, &slow, test_now() + Duration::minutes(3), true);
        assert!(engine.cooldown().retest_since_last);
    }

    #[test]
    fn chop_inside_cloud_never_proposes() {
        let mut engine = ScalpEngine::new();
        let fast = make_flat_series(40, 5000.0);
        let medium = make_flat_series(30, 5000.0);
        let slow = make_flat_series(60, 5000.0);

        let alert = engine.on_tick(&fast, &medium, &slow, test_now(), true);
        assert!(alert.is_none());
        assert_eq!(engine.director().regime, Regime::Chop);
    }

    #[test]
    fn push_flag_follows_gate_and_confidence() {
        let mut engine = ScalpEngine::new();
        let fast = make_bullish_trend(70, 5000.0);
        let medium = make_bullish_trend(30, 5000.0);
        let slow = make_bullish_trend(60, 4900.0);

        // Drive with pushes disallowed: alert still fires, push flag off.
        let mut found = None;
        for n in 60..=fast.len() {
            let now = test_now() + Duration::minutes(n as i64);
            if let Some(a) = engine.on_tick(&prefix(&fast, n), &medium, &slow, now, false) {
                found = Some(a);
                break;
            }
        }
        let alert = found.expect("alert");
        assert!(!alert.should_push);
    }
}
