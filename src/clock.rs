//! Time sources for expiration checks

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Utc};

/// Milliseconds in one minute
pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// Source of the current instant, in epoch milliseconds
pub trait Clock {
    fn now_millis(&self) -> i64;

    /// Current instant as a UTC timestamp
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.now_millis()).unwrap_or_default()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock
///
/// Clones share the same instant, so a test can keep one handle and
/// give another to the store.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: Rc::new(Cell::new(start_millis)),
        }
    }

    /// Start at the given UTC instant
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self::new(instant.timestamp_millis())
    }

    pub fn set_millis(&self, millis: i64) {
        self.millis.set(millis);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.millis.set(self.millis.get() + millis);
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.advance_millis(minutes * MILLIS_PER_MINUTE);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();

        handle.advance_minutes(2);
        assert_eq!(clock.now_millis(), 1_000 + 2 * MILLIS_PER_MINUTE);

        clock.set_millis(5);
        assert_eq!(handle.now_millis(), 5);
    }

    #[test]
    fn test_manual_clock_now() {
        let clock = ManualClock::new(0);
        assert_eq!(clock.now().timestamp(), 0);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}
