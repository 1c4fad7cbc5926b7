//! Clock abstraction for timestamps written to the data store.
//!
//! Every timestamp the service records (blacklist entries, bans, payment
//! records) comes from a `Clock`, so tests can pin them to known values.

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime},
};

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of wall-clock time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current system time.
    fn now_system(&self) -> SystemTime;

    /// Returns the current time as a UTC datetime.
    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.now_system())
    }

    /// Returns the current time as an RFC 3339 string with microseconds.
    fn now_rfc3339(&self) -> String {
        self.now_utc().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Returns whole seconds since the Unix epoch.
    fn unix_seconds(&self) -> i64 {
        self.now_utc().timestamp()
    }
}

/// Production clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now_system(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Controllable clock for deterministic tests.
///
/// Clones share the same underlying time, so a handle kept by the test can
/// advance the clock seen by the code under test.
#[derive(Debug, Clone)]
pub struct TestClock {
    /// Milliseconds since the Unix epoch
    millis: Arc<AtomicI64>,
}

impl TestClock {
    /// Creates a test clock starting at the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Creates a test clock starting at a specific instant.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { millis: Arc::new(AtomicI64::new(start.timestamp_millis())) }
    }

    /// Creates a test clock starting at a Unix timestamp in seconds.
    pub fn at_unix(seconds: i64) -> Self {
        Self { millis: Arc::new(AtomicI64::new(seconds.saturating_mul(1000))) }
    }

    /// Advances the clock by the specified duration.
    pub fn advance(&self, duration: Duration) {
        let delta = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(delta, Ordering::AcqRel);
    }

    /// Jumps the clock to a specific instant, forwards or backwards.
    pub fn jump_to(&self, time: DateTime<Utc>) {
        self.millis.store(time.timestamp_millis(), Ordering::Release);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now_system(&self) -> SystemTime {
        let millis = self.millis.load(Ordering::Acquire);
        let offset = Duration::from_millis(millis.unsigned_abs());
        if millis >= 0 {
            SystemTime::UNIX_EPOCH + offset
        } else {
            SystemTime::UNIX_EPOCH - offset
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_clock_reports_start_time() {
        let start = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).single().unwrap_or_default();
        let clock = TestClock::at(start);

        assert_eq!(clock.now_utc(), start);
        assert_eq!(clock.unix_seconds(), start.timestamp());
    }

    #[test]
    fn test_clock_advances_shared_handles() {
        let clock = TestClock::at_unix(1_000);
        let handle = clock.clone();

        handle.advance(Duration::from_secs(60));

        assert_eq!(clock.unix_seconds(), 1_060);
    }

    #[test]
    fn test_clock_jumps_backwards() {
        let clock = TestClock::at_unix(5_000);
        let earlier = Utc.timestamp_opt(2_000, 0).single().unwrap_or_default();

        clock.jump_to(earlier);

        assert_eq!(clock.unix_seconds(), 2_000);
    }

    #[test]
    fn rfc3339_output_is_utc() {
        let clock = TestClock::at_unix(0);
        assert_eq!(clock.now_rfc3339(), "1970-01-01T00:00:00.000000Z");
    }
}
