use core::time::Duration;

use crate::{
    error::{Error, Result},
    id::SnowflakeId,
    time::CUSTOM_EPOCH,
};

/// Generators accept worker ids strictly below this value.
pub const WORKER_ID_LIMIT: u64 = SnowflakeId::WORKER_ID_MASK;

/// What a generator does when the clock reads earlier than the last
/// timestamp it issued an ID for.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClockRegressionPolicy {
    /// Keep waiting until the clock catches up, then continue issuing from the
    /// last timestamp. Callers see extra latency, never an error.
    #[default]
    Wait,
    /// Fail the call with [`Error::ClockRegression`]. The generator state is
    /// left untouched, so a later call succeeds once the clock catches up.
    Fail,
}

/// Construction parameters shared by both generator strategies.
///
/// With the `serde` feature this can be deserialized from any format; missing
/// fields take their [`Default`] values.
///
/// # Example
/// ```
/// use core::time::Duration;
/// use flakeid::{ClockRegressionPolicy, GeneratorConfig};
///
/// let config = GeneratorConfig::new(5)
///     .with_epoch(Duration::from_millis(1_700_000_000_000))
///     .with_clock_regression(ClockRegressionPolicy::Fail);
/// assert!(config.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorConfig {
    /// Externally allocated id, unique among live generators. Must be below
    /// [`WORKER_ID_LIMIT`].
    pub worker_id: u64,
    /// The epoch, in milliseconds since the UNIX epoch.
    pub epoch_millis: u64,
    pub clock_regression: ClockRegressionPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            worker_id: 0,
            epoch_millis: duration_millis(CUSTOM_EPOCH),
            clock_regression: ClockRegressionPolicy::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new(worker_id: u64) -> Self {
        Self {
            worker_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch_millis = duration_millis(epoch);
        self
    }

    #[must_use]
    pub fn with_clock_regression(mut self, policy: ClockRegressionPolicy) -> Self {
        self.clock_regression = policy;
        self
    }

    pub fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_millis)
    }

    /// Checks the parts of the configuration that do not depend on a clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWorkerId`] if the worker id is not below
    /// [`WORKER_ID_LIMIT`].
    pub fn validate(&self) -> Result<()> {
        if self.worker_id >= WORKER_ID_LIMIT {
            return Err(Error::InvalidWorkerId {
                worker_id: self.worker_id,
                max: WORKER_ID_LIMIT,
            });
        }
        Ok(())
    }

    /// Validates the config against a first clock reading and returns the
    /// reading to seed the sequence counter with.
    pub(crate) fn initial_timestamp(&self, now: u64) -> Result<u64> {
        self.validate()?;
        if now < self.epoch_millis {
            return Err(Error::EpochInFuture {
                now,
                epoch: self.epoch_millis,
            });
        }
        Ok(now)
    }

    /// Returns the offset of `now` from the epoch if it is past the 41-bit
    /// capacity.
    #[inline]
    pub(crate) fn exhausted_offset(&self, now: u64) -> Option<u64> {
        let offset = now.saturating_sub(self.epoch_millis);
        (offset > SnowflakeId::max_timestamp()).then_some(offset)
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
