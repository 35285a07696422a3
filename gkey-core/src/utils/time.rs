use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Source of "now" for the key manager.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Human readable rendering of a millisecond delta using the two coarsest
/// non-zero units out of days/hours/minutes: "2d 4h", "2h 30m", "45 minutes",
/// "< 1 minute".
pub fn format_duration_ms(ms: i64) -> String {
    if ms < MS_PER_MINUTE {
        return "< 1 minute".to_string();
    }

    let days = ms / MS_PER_DAY;
    let hours = (ms % MS_PER_DAY) / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;

    if days == 0 && hours == 0 {
        return if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", minutes)
        };
    }

    [(days, "d"), (hours, "h"), (minutes, "m")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .take(2)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect::<Vec<_>>()
        .join(" ")
}
