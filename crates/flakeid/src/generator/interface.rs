use core::time::Duration;

use crossbeam_utils::Backoff;

use crate::{
    error::Result,
    generator::Poll,
    id::{Components, SnowflakeId},
};

/// A minimal interface for generating Snowflake IDs.
///
/// Implementors supply the non-blocking [`try_poll_id`]; the blocking
/// [`generate`] is provided on top of it.
///
/// [`try_poll_id`]: SnowflakeGenerator::try_poll_id
/// [`generate`]: SnowflakeGenerator::generate
pub trait SnowflakeGenerator {
    /// Attempts to issue the next ID without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error for conditions the generator cannot wait out: epoch
    /// exhaustion, a clock regression under
    /// [`ClockRegressionPolicy::Fail`], a stopped ticker, or a poisoned lock.
    ///
    /// [`ClockRegressionPolicy::Fail`]: crate::ClockRegressionPolicy::Fail
    fn try_poll_id(&self) -> Result<Poll>;

    /// The worker id encoded into every ID this generator issues.
    fn worker_id(&self) -> u64;

    /// Issues the next ID, waiting for the clock if the current millisecond
    /// is exhausted.
    ///
    /// The wait is a loop that re-polls the clock; under a healthy clock it
    /// lasts at most about one millisecond. A frozen clock stalls it.
    ///
    /// # Errors
    ///
    /// Propagates every error from [`SnowflakeGenerator::try_poll_id`].
    fn generate(&self) -> Result<SnowflakeId> {
        let backoff = Backoff::new();
        loop {
            match self.try_poll_id()? {
                Poll::Ready { id } => return Ok(id),
                Poll::Pending { yield_for } => {
                    // Only a regressed clock asks for more than one tick;
                    // sleep through most of it instead of spinning.
                    if yield_for > 1 {
                        std::thread::sleep(Duration::from_millis(yield_for - 1));
                    }
                    backoff.snooze();
                }
            }
        }
    }

    /// Splits an ID into its fields.
    fn decode(&self, id: SnowflakeId) -> Components {
        id.decode()
    }
}
