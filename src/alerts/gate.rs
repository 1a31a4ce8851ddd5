use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::US::Eastern;

/// Predicate consulted before push/audio side effects fire. The engine still
/// produces alerts when this is false; only `should_push` is affected.
pub trait PushGate: Send + Sync {
    fn push_allowed(&self) -> bool;
}

/// Regular trading hours gate: 9:30-16:00 ET, Monday through Friday.
pub struct MarketHoursGate {
    enabled: bool,
}

const OPEN_MINUTE: u32 = 9 * 60 + 30;
const CLOSE_MINUTE: u32 = 16 * 60;

impl MarketHoursGate {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn allowed_at(&self, utc_now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        let et_now = utc_now.with_timezone(&Eastern);
        if matches!(et_now.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let minute = et_now.hour() * 60 + et_now.minute();
        (OPEN_MINUTE..CLOSE_MINUTE).contains(&minute)
    }
}

impl PushGate for MarketHoursGate {
    fn push_allowed(&self) -> bool {
        self.allowed_at(Utc::now())
    }
}
