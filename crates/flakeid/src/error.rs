use core::fmt;

use crate::generator::ClockRegressionPolicy;

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Names one of the three packed fields of a [`SnowflakeId`].
///
/// [`SnowflakeId`]: crate::SnowflakeId
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    WorkerId,
    Sequence,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timestamp => "timestamp",
            Self::WorkerId => "worker_id",
            Self::Sequence => "sequence",
        })
    }
}

/// All error variants that `flakeid` can emit.
///
/// Sequence exhaustion within a millisecond is *not* an error: generators
/// absorb it by waiting for the clock to advance.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The worker id does not fit the range accepted by generators.
    ///
    /// This is a configuration error and is only returned at construction.
    #[error("worker id {worker_id} is out of range (must be below {max})")]
    InvalidWorkerId { worker_id: u64, max: u64 },

    /// The clock currently reads earlier than the configured epoch, so no
    /// timestamp offset can be computed.
    #[error("clock reads {now} ms, which is before the epoch at {epoch} ms")]
    EpochInFuture { now: u64, epoch: u64 },

    /// The generator cannot honour the requested clock-regression policy.
    ///
    /// [`TickedSnowflakeGenerator`] never observes time on the caller's path,
    /// so it only supports [`ClockRegressionPolicy::Wait`].
    ///
    /// [`TickedSnowflakeGenerator`]: crate::TickedSnowflakeGenerator
    /// [`ClockRegressionPolicy::Wait`]: crate::ClockRegressionPolicy::Wait
    #[error("clock regression policy {policy:?} is not supported by this generator")]
    UnsupportedRegressionPolicy { policy: ClockRegressionPolicy },

    /// The timestamp offset no longer fits in 41 bits.
    ///
    /// Fatal for this ID scheme: wrapping the timestamp would break
    /// uniqueness, so the generator refuses to issue any more IDs.
    #[error("timestamp offset {offset} ms exceeds the 41-bit capacity")]
    EpochExhausted { offset: u64 },

    /// The clock reported a time earlier than the last issued timestamp.
    ///
    /// Only returned under [`ClockRegressionPolicy::Fail`]. Callers may retry
    /// once the clock has caught up.
    ///
    /// [`ClockRegressionPolicy::Fail`]: crate::ClockRegressionPolicy::Fail
    #[error("clock moved backwards: last issued at {last} ms, now {now} ms")]
    ClockRegression { last: u64, now: u64 },

    /// A value passed to [`SnowflakeId::encode`] is wider than its field.
    ///
    /// [`SnowflakeId::encode`]: crate::SnowflakeId::encode
    #[error("{field} value {value} exceeds field maximum {max}")]
    FieldOverflow { field: Field, value: u64, max: u64 },

    /// The ticker driving a [`TickedSnowflakeGenerator`] has been stopped and
    /// the current millisecond is exhausted.
    ///
    /// [`TickedSnowflakeGenerator`]: crate::TickedSnowflakeGenerator
    #[error("ticker stopped; no further millisecond rollovers will happen")]
    TickerStopped,

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. With the
    /// `parking-lot` feature mutexes do not poison and this is never built.
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
