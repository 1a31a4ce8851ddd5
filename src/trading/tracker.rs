use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::models::{Direction, Strength, TradeState};
use crate::strategies::signals::TradeSignal;

/// Follows the single active recommendation for one instrument from
/// proposal through its profit/stop outcome. Owns the lifecycle state
/// exclusively; every transition happens through these methods.
#[derive(Debug, Default)]
pub struct TradeTracker {
    state: TradeState,
    signal: Option<TradeSignal>,
    adopted_at: Option<DateTime<Utc>>,
    reference_at: Option<DateTime<Utc>>,
}

impl TradeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TradeState {
        self.state
    }

    pub fn signal(&self) -> Option<&TradeSignal> {
        self.signal.as_ref()
    }

    /// Time since the current reference point (adoption, or activation once
    /// tracking started).
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.reference_at.map(|t| now - t)
    }

    /// Deliver a fresh recommendation. Returns true only when the signal was
    /// newly adopted; an unchanged identity key is a silent no-op so
    /// re-deliveries never re-fire notification side effects. LOW-strength
    /// signals are adopted only into an empty tracker.
    pub fn on_signal(&mut self, signal: TradeSignal, now: DateTime<Utc>) -> bool {
        if let Some(current) = &self.signal {
            if current.key() == signal.key() {
                return false;
            }
            if signal.strength == Strength::Low {
                debug!("ignoring LOW signal while tracking {}", current.direction);
                return false;
            }
        }

        info!(
            "adopting {} {} @ ${:.0} ({})",
            signal.strength, signal.direction, signal.strike_price, signal.reason
        );
        self.signal = Some(signal);
        self.state = TradeState::Pending;
        self.adopted_at = Some(now);
        self.reference_at = Some(now);
        true
    }

    /// Begin following the recommendation: PENDING -> ACTIVE, resetting the
    /// elapsed-time reference.
    pub fn start_tracking(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != TradeState::Pending {
            return false;
        }
        self.state = TradeState::Active;
        self.reference_at = Some(now);
        if let Some(signal) = &mut self.signal {
            signal.timestamp = now;
        }
        true
    }

    /// Re-evaluate an ACTIVE recommendation against the current underlying
    /// price. Returns the new state when a transition happened.
    pub fn on_tick(&mut self, price: f64) -> Option<TradeState> {
        if self.state != TradeState::Active {
            return None;
        }
        let signal = self.signal.as_ref()?;

        let outcome = match signal.direction {
            Direction::Call => {
                if signal.target_spx_price.is_finite() && price >= signal.target_spx_price {
                    Some(TradeState::Profit)
                } else if signal.stop_spx_price.is_finite() && price <= signal.stop_spx_price {
                    Some(TradeState::Stopped)
                } else {
                    None
                }
            }
            Direction::Put => {
                if signal.target_spx_price.is_finite() && price <= signal.target_spx_price {
                    Some(TradeState::Profit)
                } else if signal.stop_spx_price.is_finite() && price >= signal.stop_spx_price {
                    Some(TradeState::Stopped)
                } else {
                    None
                }
            }
        };

        if let Some(new_state) = outcome {
            info!(
                "{} {} @ ${:.2}: {}",
                signal.direction, signal.strike_price, price, new_state
            );
            self.state = new_state;
        }
        outcome
    }

    /// Drop the tracked recommendation from any state.
    pub fn clear(&mut self) {
        self.state = TradeState::Idle;
        self.signal = None;
        self.adopted_at = None;
        self.reference_at = None;
    }
}
