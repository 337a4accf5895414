use crate::id::SnowflakeId;

/// What a [`SequenceCounter`] decided for one observed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Issue an ID with these fields.
    Issue { timestamp: u64, sequence: u64 },
    /// All 4096 sequences of `timestamp` were issued; wait for a later tick.
    Exhausted { timestamp: u64 },
    /// The observed time is behind the last issued timestamp.
    ClockBehind { last: u64, now: u64 },
}

/// Per-generator `(last_timestamp, sequence)` state machine.
///
/// `sequence` counts the IDs already issued within `last_timestamp`, so the
/// next one issued in the same millisecond carries that count as its sequence
/// number. The counter is a plain value; generators put it behind their single
/// lock and keep the locked region to one call on it.
///
/// Timestamps are whatever unit the caller feeds in. The crate's generators
/// use milliseconds since the UNIX epoch and subtract their own epoch only
/// when packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceCounter {
    last_timestamp: u64,
    sequence: u64,
}

impl SequenceCounter {
    /// Number of sequence values available per timestamp.
    pub const SEQUENCES_PER_TICK: u64 = SnowflakeId::SEQUENCE_MASK + 1;

    /// Starts an empty window at `timestamp`.
    pub const fn new(timestamp: u64) -> Self {
        Self {
            last_timestamp: timestamp,
            sequence: 0,
        }
    }

    pub const fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    /// Number of IDs issued within [`Self::last_timestamp`].
    pub const fn issued(&self) -> u64 {
        self.sequence
    }

    /// Applies the full transition for a caller that read the clock itself.
    #[inline]
    pub fn observe(&mut self, now: u64) -> Decision {
        if now > self.last_timestamp {
            self.last_timestamp = now;
            self.sequence = 0;
        } else if now < self.last_timestamp {
            return Decision::ClockBehind {
                last: self.last_timestamp,
                now,
            };
        }
        self.take()
    }

    /// Issues the next sequence of the cached timestamp without reading any
    /// clock.
    #[inline]
    pub fn take(&mut self) -> Decision {
        if self.sequence < Self::SEQUENCES_PER_TICK {
            let sequence = self.sequence;
            self.sequence += 1;
            Decision::Issue {
                timestamp: self.last_timestamp,
                sequence,
            }
        } else {
            Decision::Exhausted {
                timestamp: self.last_timestamp,
            }
        }
    }

    /// Moves the window forward to `now` if it is later than the cached
    /// timestamp. Never moves it backwards.
    ///
    /// Returns `true` if the window was reset.
    #[inline]
    pub fn rollover(&mut self, now: u64) -> bool {
        if now > self.last_timestamp {
            self.last_timestamp = now;
            self.sequence = 0;
            true
        } else {
            false
        }
    }
}
