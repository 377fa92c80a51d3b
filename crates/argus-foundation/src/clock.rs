//! # Clock abstraction and time conversion
//!
//! Time-gated components (frame sampler, stream rotator) take a [`Clock`]
//! so that rate and rotation behavior can be tested deterministically with
//! [`TestClock`]. Monotonic-to-wall-clock conversion is centralized here:
//! every outbound timestamp goes through [`epoch_to_iso_utc`].

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Clock trait for time abstraction
pub trait Clock: Send + Sync {
    /// Get the current monotonic time
    fn now(&self) -> Instant;
}

/// Real-time clock implementation
pub struct RealClock;

impl Default for RealClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RealClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual clock for deterministic testing
pub struct TestClock {
    current_time: std::sync::Mutex<Instant>,
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            current_time: std::sync::Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut current = self.current_time.lock().unwrap();
        *current += duration;
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }
}

/// Format a UTC timestamp as ISO-8601 with second precision (`2024-01-30T18:22:09Z`).
pub fn epoch_to_iso_utc(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Convert a monotonic instant into wall-clock time, anchored to the pair
/// (`started_epoch`, `started`) captured together at session creation.
pub fn monotonic_to_epoch(
    started_epoch: DateTime<Utc>,
    started: Instant,
    at: Instant,
) -> DateTime<Utc> {
    let elapsed = at.saturating_duration_since(started);
    started_epoch + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero())
}

/// Wall-clock time at `offset` past a stream's epoch start. Used to place
/// recognizer-reported offsets on the session timeline.
pub fn offset_to_epoch(started_epoch: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
    started_epoch + chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn iso_format_is_second_precision_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 30, 18, 22, 9).unwrap();
        assert_eq!(epoch_to_iso_utc(at), "2024-01-30T18:22:09Z");
    }

    #[test]
    fn monotonic_conversion_tracks_elapsed() {
        let epoch = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let start = Instant::now();
        let later = start + Duration::from_secs(90);
        let converted = monotonic_to_epoch(epoch, start, later);
        assert_eq!(converted, epoch + chrono::Duration::seconds(90));
    }

    #[test]
    fn monotonic_conversion_saturates_backwards() {
        let epoch = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let start = Instant::now() + Duration::from_secs(10);
        // An instant before the anchor must not move the epoch backwards.
        assert_eq!(monotonic_to_epoch(epoch, start, Instant::now()), epoch);
    }

    #[test]
    fn test_clock_advances_manually() {
        let clock = TestClock::new();
        let before = clock.now();
        clock.advance(Duration::from_millis(500));
        assert_eq!(clock.now() - before, Duration::from_millis(500));
    }
}
