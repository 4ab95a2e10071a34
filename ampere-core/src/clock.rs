use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Source of "now" for timestamps, deadlines and document numbers.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Midnight UTC of the given calendar day.
    pub fn on(
        year: i32,
        month: u32,
        day: u32,
    ) -> Self {
        let now = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or_else(Utc::now);
        Self::new(now)
    }

    pub fn set(
        &self,
        now: DateTime<Utc>,
    ) {
        *self.lock() = now;
    }

    pub fn advance(
        &self,
        by: Duration,
    ) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}
