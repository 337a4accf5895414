use core::{ops::ControlFlow, time::Duration};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    error::{Error, Result},
    generator::{
        ClockRegressionPolicy, Decision, GeneratorConfig, Mutex, Poll, SequenceCounter,
        SnowflakeGenerator, Ticker, lock_state,
    },
    id::SnowflakeId,
    time::TimeSource,
};

/// Marks "not exhausted" in [`TickShared::exhausted_offset`]. Any real
/// exhausted offset is larger than the 41-bit maximum and so never zero.
const NOT_EXHAUSTED: u64 = 0;

#[derive(Debug)]
struct TickShared {
    #[cfg(feature = "cache-padded")]
    counter: crossbeam_utils::CachePadded<Mutex<SequenceCounter>>,
    #[cfg(not(feature = "cache-padded"))]
    counter: Mutex<SequenceCounter>,
    exhausted_offset: AtomicU64,
}

impl TickShared {
    fn exhausted(&self) -> Option<u64> {
        match self.exhausted_offset.load(Ordering::Acquire) {
            NOT_EXHAUSTED => None,
            offset => Some(offset),
        }
    }

    fn latch_exhausted(&self, offset: u64) {
        self.exhausted_offset.store(offset, Ordering::Release);
    }
}

/// A Snowflake ID generator whose clock is read by a background ticker, not
/// by callers.
///
/// A [`Ticker`] thread wakes once per millisecond, reads the [`TimeSource`],
/// and rolls the sequence window forward under the same lock callers use.
/// Callers only lock, take the next sequence of the cached timestamp, and
/// unlock. This removes a clock read from the hot path at the price of one
/// extra lock acquisition per millisecond.
///
/// ## Clock regressions
/// The ticker never moves the window backwards, so a regressed clock looks
/// like a frozen one: callers keep drawing sequences from the last timestamp
/// and wait once it is exhausted. Only [`ClockRegressionPolicy::Wait`] is
/// accepted; a config asking for [`ClockRegressionPolicy::Fail`] is rejected
/// at construction.
///
/// ## Lifecycle
/// The ticker starts in the constructor and is stopped and joined on drop.
/// [`Self::stop`] stops it early and is terminal: the clock has moved into
/// the ticker thread and there is no restart. Afterwards callers can still
/// drain the current millisecond, then get [`Error::TickerStopped`]; build a
/// new generator to resume.
///
/// ## See Also
/// - [`LockSnowflakeGenerator`]
///
/// [`LockSnowflakeGenerator`]: crate::LockSnowflakeGenerator
#[derive(Debug)]
pub struct TickedSnowflakeGenerator {
    shared: Arc<TickShared>,
    ticker: Ticker,
    config: GeneratorConfig,
}

impl TickedSnowflakeGenerator {
    /// Creates a generator for `worker_id` whose timestamps count from
    /// `epoch`, and starts its ticker thread.
    ///
    /// The clock is moved into the ticker thread.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidWorkerId`] if `worker_id` is 2047 or more
    /// - [`Error::EpochInFuture`] if `time` currently reads before `epoch`
    ///
    /// # Example
    /// ```
    /// use flakeid::{MonotonicClock, SnowflakeGenerator, TickedSnowflakeGenerator, CUSTOM_EPOCH};
    ///
    /// let generator = TickedSnowflakeGenerator::new(3, CUSTOM_EPOCH, MonotonicClock::new()).unwrap();
    /// let id = generator.generate().unwrap();
    /// assert_eq!(generator.decode(id).worker_id, 3);
    /// ```
    pub fn new<T>(worker_id: u64, epoch: Duration, time: T) -> Result<Self>
    where
        T: TimeSource + Send + 'static,
    {
        Self::with_config(GeneratorConfig::new(worker_id).with_epoch(epoch), time)
    }

    /// Creates a generator from a full [`GeneratorConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`], plus [`Error::UnsupportedRegressionPolicy`] if
    /// `config` asks for [`ClockRegressionPolicy::Fail`].
    pub fn with_config<T>(config: GeneratorConfig, time: T) -> Result<Self>
    where
        T: TimeSource + Send + 'static,
    {
        if config.clock_regression != ClockRegressionPolicy::Wait {
            return Err(Error::UnsupportedRegressionPolicy {
                policy: config.clock_regression,
            });
        }
        let now = config.initial_timestamp(time.current_millis())?;
        let counter = SequenceCounter::new(now);
        let shared = Arc::new(TickShared {
            #[cfg(feature = "cache-padded")]
            counter: crossbeam_utils::CachePadded::new(Mutex::new(counter)),
            #[cfg(not(feature = "cache-padded"))]
            counter: Mutex::new(counter),
            exhausted_offset: AtomicU64::new(NOT_EXHAUSTED),
        });
        if let Some(offset) = config.exhausted_offset(now) {
            shared.latch_exhausted(offset);
        }

        let ticker = {
            let shared = Arc::clone(&shared);
            Ticker::start(move || Self::tick(&shared, &config, &time))
        };

        tracing::debug!(
            worker_id = config.worker_id,
            epoch_millis = config.epoch_millis,
            "created ticked generator"
        );
        Ok(Self {
            shared,
            ticker,
            config,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn epoch(&self) -> Duration {
        self.config.epoch()
    }

    /// Returns `false` once the ticker has been stopped or has exited because
    /// the epoch was exhausted.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Stops and joins the ticker thread. Idempotent and terminal.
    pub fn stop(&mut self) {
        self.ticker.stop();
    }

    /// Attempts to issue the next ID without waiting or reading the clock.
    ///
    /// # Errors
    /// - [`Error::EpochExhausted`] once the ticker has seen the clock pass
    ///   the 41-bit timestamp capacity
    /// - [`Error::TickerStopped`] if the millisecond is exhausted and the
    ///   ticker is no longer running
    /// - `Error::LockPoisoned` if another caller panicked while holding the
    ///   lock (std mutex only)
    pub fn try_poll_id(&self) -> Result<Poll> {
        if let Some(offset) = self.shared.exhausted() {
            return Err(Error::EpochExhausted { offset });
        }

        let decision = lock_state(&self.shared.counter)?.take();

        match decision {
            Decision::Issue {
                timestamp,
                sequence,
            } => Ok(Poll::Ready {
                id: SnowflakeId::from_components_unchecked(
                    timestamp - self.config.epoch_millis,
                    self.config.worker_id,
                    sequence,
                ),
            }),
            _ if !self.ticker.is_running() => Err(self.cold_stopped()),
            _ => Ok(Poll::Pending { yield_for: 1 }),
        }
    }

    /// Issues the next ID, waiting for the ticker if the current millisecond
    /// is exhausted.
    ///
    /// # Errors
    ///
    /// See [`Self::try_poll_id`].
    pub fn generate(&self) -> Result<SnowflakeId> {
        SnowflakeGenerator::generate(self)
    }

    /// One ticker step: read the clock, then roll the window forward if it
    /// advanced. Runs on the ticker thread.
    fn tick<T: TimeSource>(
        shared: &TickShared,
        config: &GeneratorConfig,
        time: &T,
    ) -> ControlFlow<()> {
        let now = time.current_millis();
        if let Some(offset) = config.exhausted_offset(now) {
            tracing::error!(offset, "timestamp capacity exhausted, stopping ticker");
            shared.latch_exhausted(offset);
            return ControlFlow::Break(());
        }
        match lock_state(&shared.counter) {
            Ok(mut counter) => {
                counter.rollover(now);
                ControlFlow::Continue(())
            }
            Err(e) => {
                tracing::error!(error = %e, "ticker cannot lock generator state");
                ControlFlow::Break(())
            }
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_stopped(&self) -> Error {
        if let Some(offset) = self.shared.exhausted() {
            return Error::EpochExhausted { offset };
        }
        Error::TickerStopped
    }

    #[cfg(test)]
    pub(crate) fn last_timestamp(&self) -> u64 {
        lock_state(&self.shared.counter)
            .map(|counter| counter.last_timestamp())
            .unwrap_or_default()
    }
}

impl SnowflakeGenerator for TickedSnowflakeGenerator {
    fn try_poll_id(&self) -> Result<Poll> {
        self.try_poll_id()
    }

    fn worker_id(&self) -> u64 {
        self.config.worker_id
    }
}
