//! Injectable wall clock
//!
//! The engine reads time for exactly two things: the output timestamp and the
//! reference year used to turn birth years into ages. Tests pin both with
//! [`FixedClock`].

use chrono::{DateTime, Datelike, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar year used for age arithmetic
    fn current_year(&self) -> i32 {
        self.now().year()
    }
}

/// Reads the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Clock pinned to a Unix timestamp in milliseconds.
    /// Out-of-range values fall back to the epoch.
    pub fn from_millis(ms: i64) -> Self {
        Self(DateTime::from_timestamp_millis(ms).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable() {
        // 2024-01-01T00:00:00Z
        let clock = FixedClock::from_millis(1_704_067_200_000);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.current_year(), 2024);
        assert_eq!(clock.now().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
