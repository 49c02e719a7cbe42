use crate::date;
use chrono::{DateTime, Duration, FixedOffset, Local, Utc};
use std::sync::Mutex;

/// Source of "now" for everything time-dependent in the feed.
///
/// The offset of the returned value decides where local day boundaries fall.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }

    /// Local midnight `days_ahead` days from today.
    ///
    /// The default keeps the offset of [`Clock::now`] for the whole span, which is wrong across
    /// a DST change; clocks that know their zone override it.
    fn start_of_day(&self, days_ahead: i64) -> DateTime<Utc> {
        date::start_of_day(&self.now(), days_ahead)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    fn start_of_day(&self, days_ahead: i64) -> DateTime<Utc> {
        date::start_of_day(&Local::now(), days_ahead)
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
