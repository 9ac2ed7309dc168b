use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, TimeZone, Utc};
use std::sync::Mutex;

use crate::models::DayWindow;

/// Source of "now" in the server's local offset
///
/// Daily limits are counted per server-local calendar day, so the clock
/// carries the offset as well as the instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }

    fn today(&self) -> DayWindow {
        day_window(&self.now())
    }
}

/// Wall clock in the process-local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Manually driven clock for tests and benchmarks
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Calendar day containing `now`, bounded by midnights in `now`'s own offset
pub fn day_window<Tz: TimeZone>(now: &DateTime<Tz>) -> DayWindow {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);

    // A DST gap can swallow midnight; fall back to the earliest valid instant.
    let start = tz
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| now.clone())
        .with_timezone(&Utc);
    let end = tz
        .from_local_datetime(&(midnight + Duration::days(1)))
        .earliest()
        .map(|end| end.with_timezone(&Utc))
        .unwrap_or_else(|| start + Duration::days(1));

    DayWindow { start, end }
}
