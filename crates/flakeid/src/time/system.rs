use std::time::{SystemTime, UNIX_EPOCH};

use crate::time::TimeSource;

/// The operating system's wall clock.
///
/// Reads [`SystemTime::now`] on every call, so it follows NTP steps and manual
/// adjustments, including backwards ones. Prefer [`MonotonicClock`] unless
/// IDs must track the wall clock across long-running processes.
///
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock set before 1970 reads as 0, which generators then treat as
        // a regression or an epoch still in the future.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}
