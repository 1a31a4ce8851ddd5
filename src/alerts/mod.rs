pub mod gate;

pub use gate::{MarketHoursGate, PushGate};

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{Direction, Strength};
use crate::strategies::signals::TradeSignal;

/// Most-recent-first alert retention.
pub const HISTORY_CAPACITY: usize = 50;

/// A fired scalp alert. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalpAlert {
    pub direction: Direction,
    pub explanation: String,
    pub confidence: Strength,
    pub should_push: bool,
    pub timestamp: DateTime<Utc>,
}

/// Bounded ring of recent alerts, newest first.
#[derive(Debug, Default)]
pub struct AlertHistory {
    alerts: VecDeque<ScalpAlert>,
}

impl AlertHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, alert: ScalpAlert) {
        self.alerts.push_front(alert);
        while self.alerts.len() > HISTORY_CAPACITY {
            self.alerts.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn latest(&self) -> Option<&ScalpAlert> {
        self.alerts.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScalpAlert> {
        self.alerts.iter()
    }
}

/// Side-effect boundary for alert and signal notifications. Push delivery is
/// fallible (OS notification permission, audio device); everything else is
/// fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn notify_alert(&self, alert: &ScalpAlert);
    fn notify_signal(&self, signal: &TradeSignal);
    fn push(&self, alert: &ScalpAlert) -> anyhow::Result<()>;
}

/// Default sink: structured log lines only.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify_alert(&self, alert: &ScalpAlert) {
        info!(
            "SCALP ALERT {} [{}] {}",
            alert.direction, alert.confidence, alert.explanation
        );
    }

    fn notify_signal(&self, signal: &TradeSignal) {
        info!(
            "TRADE SIGNAL {} {} @ ${:.0} | premium ~${:.2} | {}",
            signal.strength, signal.direction, signal.strike_price,
            signal.estimated_premium, signal.reason
        );
    }

    fn push(&self, alert: &ScalpAlert) -> anyhow::Result<()> {
        info!("PUSH {} {}", alert.direction, alert.explanation);
        Ok(())
    }
}

/// Owns the history ring and fans alerts out to sinks. Sink failures are
/// swallowed here; a broken notifier must never fail the engine tick.
pub struct AlertEmitter {
    history: AlertHistory,
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl AlertEmitter {
    pub fn new(sinks: Vec<Box<dyn NotificationSink>>) -> Self {
        Self {
            history: AlertHistory::new(),
            sinks,
        }
    }

    pub fn history(&self) -> &AlertHistory {
        &self.history
    }

    pub fn emit(&mut self, alert: ScalpAlert) {
        for sink in &self.sinks {
            sink.notify_alert(&alert);
            if alert.should_push {
                if let Err(e) = sink.push(&alert) {
                    debug!("push delivery failed: {}", e);
                }
            }
        }
        self.history.record(alert);
    }

    pub fn notify_signal(&self, signal: &TradeSignal) {
        for sink in &self.sinks {
            sink.notify_signal(signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_now;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn alert(direction: Direction, should_push: bool) -> ScalpAlert {
        ScalpAlert {
            direction,
            explanation: "test".to_string(),
            confidence: Strength::High,
            should_push,
            timestamp: test_now(),
        }
    }

    struct CountingSink {
        alerts: Arc<AtomicUsize>,
        pushes: Arc<AtomicUsize>,
        fail_push: bool,
    }

    impl NotificationSink for CountingSink {
        fn notify_alert(&self, _alert: &ScalpAlert) {
            self.alerts.fetch_add(1, Ordering::SeqCst);
        }
        fn notify_signal(&self, _signal: &TradeSignal) {}
        fn push(&self, _alert: &ScalpAlert) -> anyhow::Result<()> {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            if self.fail_push {
                anyhow::bail!("notification permission denied");
            }
            Ok(())
        }
    }

    #[test]
    fn history_evicts_beyond_capacity() {
        let mut history = AlertHistory::new();
        for i in 0..51 {
            let mut a = alert(Direction::Call, false);
            a.explanation = format!("alert {}", i);
            history.record(a);
        }
        assert_eq!(history.len(), 50);
        // Newest first; the very first alert fell off the back.
        assert_eq!(history.latest().unwrap().explanation, "alert 50");
        assert!(history.iter().all(|a| a.explanation != "alert 0"));
    }

    #[test]
    fn emit_dispatches_and_records() {
        let alerts = Arc::new(AtomicUsize::new(0));
        let pushes = Arc::new(AtomicUsize::new(0));
        let sink = CountingSink {
            alerts: alerts.clone(),
            pushes: pushes.clone(),
            fail_push: false,
        };
        let mut emitter = AlertEmitter::new(vec![Box::new(sink)]);

        emitter.emit(alert(Direction::Call, false));
        emitter.emit(alert(Direction::Put, true));

        assert_eq!(alerts.load(Ordering::SeqCst), 2);
        assert_eq!(pushes.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.history().len(), 2);
    }

    #[test]
    fn push_failure_is_swallowed() {
        let alerts = Arc::new(AtomicUsize::new(0));
        let pushes = Arc::new(AtomicUsize::new(0));
        let sink = CountingSink {
            alerts: alerts.clone(),
            pushes: pushes.clone(),
            fail_push: true,
        };
        let mut emitter = AlertEmitter::new(vec![Box::new(sink)]);

        emitter.emit(alert(Direction::Call, true));
        emitter.emit(alert(Direction::Put, true));

        // Both alerts still dispatched and recorded after the failure.
        assert_eq!(alerts.load(Ordering::SeqCst), 2);
        assert_eq!(emitter.history().len(), 2);
    }
}
