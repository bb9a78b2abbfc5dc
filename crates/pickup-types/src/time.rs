//! Time source abstraction.
//!
//! Services read the clock through `TimeSource` so tests can pin and move
//! time deterministically.

use chrono::{DateTime, Local, TimeZone, Timelike, Utc};
use parking_lot::RwLock;

/// Wall-clock instant used throughout the domain.
pub type Timestamp = DateTime<Utc>;

/// Clock port.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// System clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Manually driven clock for tests and replay tooling.
#[derive(Debug)]
pub struct ManualTimeSource {
    time: RwLock<Timestamp>,
}

impl ManualTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: RwLock::new(initial),
        }
    }

    pub fn set(&self, time: Timestamp) {
        *self.time.write() = time;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut t = self.time.write();
        *t += by;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        *self.time.read()
    }
}

/// Midnight of the server's local calendar day containing `now`, in UTC.
///
/// Falls back to `now` minus the local time-of-day when midnight does not
/// exist locally (DST gap).
pub fn start_of_local_day(now: Timestamp) -> Timestamp {
    let local = now.with_timezone(&Local);
    let midnight = local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest());

    match midnight {
        Some(m) => m.with_timezone(&Utc),
        None => {
            let since_midnight = local.time().num_seconds_from_midnight();
            now - chrono::Duration::seconds(i64::from(since_midnight))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_manual_time_source() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let clock = ManualTimeSource::new(start);
        assert_eq!(clock.now(), start);
        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now(), start + Duration::seconds(30));
    }

    #[test]
    fn test_start_of_day_is_not_after_now() {
        let now = Utc::now();
        let start = start_of_local_day(now);
        assert!(start <= now);
        assert!(now - start < Duration::hours(25));
    }

    #[test]
    fn test_start_of_day_is_idempotent() {
        let now = Utc::now();
        let start = start_of_local_day(now);
        assert_eq!(start_of_local_day(start), start);
    }
}
