use core::time::Duration;

use crate::{
    error::{Error, Result},
    generator::{
        ClockRegressionPolicy, Decision, GeneratorConfig, Mutex, Poll, SequenceCounter,
        SnowflakeGenerator, lock_state,
    },
    id::SnowflakeId,
    time::TimeSource,
};

/// A lock-based Snowflake ID generator that reads the clock on every call.
///
/// Each call takes the lock, samples the [`TimeSource`], and applies the
/// sequence transition: one clock read plus a compare and update of two
/// integers. Packing happens after the lock is released.
///
/// ## Features
/// - ✅ Thread-safe (`Send + Sync` whenever the clock is)
/// - ✅ No background thread
/// - ✅ Clock regressions handled per [`ClockRegressionPolicy`]
///
/// ## Recommended When
/// - Reading the clock is cheap (vDSO `clock_gettime`, [`MonotonicClock`])
/// - You want the fewest moving parts
///
/// ## See Also
/// - [`TickedSnowflakeGenerator`]
///
/// [`MonotonicClock`]: crate::MonotonicClock
/// [`TickedSnowflakeGenerator`]: crate::TickedSnowflakeGenerator
#[derive(Debug)]
pub struct LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<SequenceCounter>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<SequenceCounter>,
    config: GeneratorConfig,
    time: T,
}

impl<T> LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator for `worker_id` whose timestamps count from
    /// `epoch` (a duration since the UNIX epoch).
    ///
    /// The sequence window starts at the clock's current reading, so the
    /// first ID issued in that millisecond has sequence 0.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidWorkerId`] if `worker_id` is 2047 or more
    /// - [`Error::EpochInFuture`] if `time` currently reads before `epoch`
    ///
    /// # Example
    /// ```
    /// use flakeid::{LockSnowflakeGenerator, MonotonicClock, SnowflakeGenerator, TWITTER_EPOCH};
    ///
    /// let generator = LockSnowflakeGenerator::new(5, TWITTER_EPOCH, MonotonicClock::new()).unwrap();
    /// let a = generator.generate().unwrap();
    /// let b = generator.generate().unwrap();
    /// assert!(a < b);
    /// assert_eq!(generator.decode(a).worker_id, 5);
    /// ```
    pub fn new(worker_id: u64, epoch: Duration, time: T) -> Result<Self> {
        Self::with_config(GeneratorConfig::new(worker_id).with_epoch(epoch), time)
    }

    /// Creates a generator from a full [`GeneratorConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_config(config: GeneratorConfig, time: T) -> Result<Self> {
        let now = config.initial_timestamp(time.current_millis())?;
        tracing::debug!(
            worker_id = config.worker_id,
            epoch_millis = config.epoch_millis,
            policy = ?config.clock_regression,
            "created lock generator"
        );
        let counter = SequenceCounter::new(now);
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(counter)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(counter),
            config,
            time,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn epoch(&self) -> Duration {
        self.config.epoch()
    }

    /// Attempts to issue the next ID without waiting.
    ///
    /// # Returns
    /// - `Ok(Poll::Ready { id })`: a new ID
    /// - `Ok(Poll::Pending { yield_for })`: the millisecond is exhausted, or
    ///   the clock is behind under [`ClockRegressionPolicy::Wait`]
    ///
    /// # Errors
    /// - [`Error::EpochExhausted`] past the 41-bit timestamp capacity
    /// - [`Error::ClockRegression`] under [`ClockRegressionPolicy::Fail`]
    /// - `Error::LockPoisoned` if another caller panicked while holding the
    ///   lock (std mutex only)
    pub fn try_poll_id(&self) -> Result<Poll> {
        let decision = {
            let mut counter = lock_state(&self.state)?;
            // Sampled under the lock: a reading taken before it could be
            // overtaken by a faster caller and look like a regression.
            let now = self.time.current_millis();
            if let Some(offset) = self.config.exhausted_offset(now) {
                drop(counter);
                return Err(Self::cold_epoch_exhausted(offset));
            }
            counter.observe(now)
        };

        match decision {
            Decision::Issue {
                timestamp,
                sequence,
            } => Ok(Poll::Ready {
                id: self.pack(timestamp, sequence),
            }),
            Decision::Exhausted { .. } => Ok(Poll::Pending { yield_for: 1 }),
            Decision::ClockBehind { last, now } => self.cold_clock_behind(last, now),
        }
    }

    /// Issues the next ID, waiting out sequence exhaustion and (under
    /// [`ClockRegressionPolicy::Wait`]) clock regressions.
    ///
    /// # Errors
    ///
    /// See [`Self::try_poll_id`].
    pub fn generate(&self) -> Result<SnowflakeId> {
        SnowflakeGenerator::generate(self)
    }

    #[inline]
    fn pack(&self, timestamp: u64, sequence: u64) -> SnowflakeId {
        // `timestamp` was issued at or after the construction reading, which
        // is at or after the epoch, and passed the capacity check.
        SnowflakeId::from_components_unchecked(
            timestamp - self.config.epoch_millis,
            self.config.worker_id,
            sequence,
        )
    }

    #[cold]
    #[inline(never)]
    fn cold_epoch_exhausted(offset: u64) -> Error {
        tracing::error!(offset, "timestamp capacity exhausted");
        Error::EpochExhausted { offset }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, last: u64, now: u64) -> Result<Poll> {
        match self.config.clock_regression {
            ClockRegressionPolicy::Wait => {
                tracing::trace!(last, now, "clock behind last issued timestamp, waiting");
                Ok(Poll::Pending {
                    yield_for: last - now,
                })
            }
            ClockRegressionPolicy::Fail => {
                tracing::warn!(last, now, "clock moved backwards");
                Err(Error::ClockRegression { last, now })
            }
        }
    }
}

impl<T> SnowflakeGenerator for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn try_poll_id(&self) -> Result<Poll> {
        self.try_poll_id()
    }

    fn worker_id(&self) -> u64 {
        self.config.worker_id
    }
}
