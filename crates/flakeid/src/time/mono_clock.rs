use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::time::TimeSource;

/// A monotonic time source anchored to the wall clock once, at construction.
///
/// The wall-clock reading taken by [`MonotonicClock::new`] fixes the origin;
/// every later reading is that origin plus the [`Instant`] time elapsed since.
/// This avoids wall-clock adjustments (e.g., NTP or daylight savings changes)
/// after startup, so the value never goes backward.
///
/// Clones share the same anchor.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    start: Instant,
    start_millis: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Samples the wall clock and starts counting from it.
    ///
    /// A wall clock earlier than 1970 is anchored at 0.
    pub fn new() -> Self {
        let start = Instant::now();
        let start_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        Self::with_anchor(start, start_millis)
    }

    /// Builds a clock that reads `start_millis` at `start`.
    pub const fn with_anchor(start: Instant, start_millis: u64) -> Self {
        Self {
            start,
            start_millis,
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        let elapsed = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.start_millis.saturating_add(elapsed)
    }
}
