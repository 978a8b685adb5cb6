//! Time sources for the session engine.
//!
//! All engine timestamps are milliseconds on a caller-supplied clock. The
//! engine never reads the system time itself, which keeps every derivation a
//! pure function of its inputs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

/// A monotonic millisecond clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall-clock anchored, `Instant`-driven clock.
///
/// Readings start at the Unix epoch milliseconds of construction and advance
/// with `Instant`, so they never go backwards even if the system time does.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    anchor: Instant,
    anchor_epoch_ms: u64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
            anchor_epoch_ms: epoch_ms(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.anchor_epoch_ms
            .saturating_add(self.anchor.elapsed().as_millis() as u64)
    }
}

/// Settable clock shared between a test and the code under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Interpret a clock reading as a wall-clock instant.
///
/// Only meaningful for readings from [`MonotonicClock`].
pub fn to_wall(ms: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(i64::try_from(ms).ok()?)
}

fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(50);
        assert_eq!(other.now_ms(), 150);
        other.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn monotonic_clock_advances_with_real_time() {
        let clock = MonotonicClock::new();
        let before = clock.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(25));
        let after = clock.now_ms();
        assert!(after >= before + 25, "advanced only {} ms", after - before);
    }

    #[test]
    fn to_wall_converts_epoch_millis() {
        let wall = to_wall(1_000).unwrap();
        assert_eq!(wall.timestamp_millis(), 1_000);
    }
}
