//! Time source for line timestamps and date rotation.

use std::fmt;

use chrono::{DateTime, Days, Local, NaiveDate};
use parking_lot::Mutex;

/// Source of the current local time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Local>;

    /// Current calendar day in local time.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
///
/// Used to drive date rotation deterministically.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Start at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(Local::now())
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    pub fn advance_days(&self, days: u64) {
        let mut now = self.now.lock();
        if let Some(next) = now.checked_add_days(Days::new(days)) {
            *now = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_by_days() {
        let clock = ManualClock::starting_now();
        let start = clock.today();

        clock.advance_days(3);

        assert_eq!(clock.today(), start + Days::new(3));
    }

    #[test]
    fn test_system_clock_is_local() {
        let before = Local::now().date_naive();
        let today = SystemClock.today();
        assert!(today >= before);
    }
}
