use crate::id::SnowflakeId;

/// The outcome of one non-blocking generation attempt.
///
/// - [`Poll::Ready`] carries a freshly issued ID.
/// - [`Poll::Pending`] means the current millisecond's sequence space is used
///   up (or the clock is behind the last issued timestamp) and the caller
///   should wait roughly `yield_for` milliseconds before polling again.
///
/// [`SnowflakeGenerator::generate`] runs this loop for you.
///
/// [`SnowflakeGenerator::generate`]: crate::SnowflakeGenerator::generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SnowflakeId,
    },
    /// No ID could be issued right now.
    Pending {
        /// Milliseconds until the clock is expected to allow progress.
        yield_for: u64,
    },
}
