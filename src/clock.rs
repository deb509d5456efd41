//! Clock collaborator for date/time access.
//!
//! The calendar engine and the scheduler never read system time directly;
//! they go through [`Clock`] so tests can pin the date.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Supplies the current date and time.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in the local timezone, truncated to day
    /// granularity. This is what "today" means on a home screen.
    fn today(&self) -> NaiveDate;
}

/// Production clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Test clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
    date: NaiveDate,
}

impl FixedClock {
    /// Pin the clock to the given date at midnight UTC.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self {
            instant: date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc())
                .unwrap_or_default(),
            date,
        }
    }

    /// Pin the clock to an exact instant; `today` uses the instant's date.
    #[must_use]
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            date: instant.date_naive(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }

    fn today(&self) -> NaiveDate {
        self.date
    }
}
