use core::fmt;

use crate::error::{Error, Field, Result};

/// A 64-bit Snowflake identifier.
///
/// - 1 bit reserved (always zero)
/// - 41 bits timestamp (ms since the generator's epoch)
/// - 11 bits worker ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            23 22             12 11             0
///              +--------------+----------------+-----------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | worker ID (11)  | sequence (12) |
///              +--------------+----------------+-----------------+---------------+
///              |<----------- MSB ---------- 64 bits ----------- LSB ------------>|
/// ```
///
/// The value is opaque: it has no arithmetic operators. Its numeric order is
/// the order in which one generator issued it, which makes the raw `u64`
/// (see [`SnowflakeId::to_raw`]) directly usable as a storage primary key.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

/// The decoded fields of a [`SnowflakeId`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Components {
    /// Milliseconds since the generator's epoch.
    pub timestamp: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

impl SnowflakeId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 23
    /// through 63.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 11-bit worker ID field. Occupies bits 12
    /// through 22.
    pub const WORKER_ID_MASK: u64 = (1 << 11) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 23).
    pub const TIMESTAMP_SHIFT: u32 = 23;

    /// Number of bits to shift the worker ID to its correct position (bit 12).
    pub const WORKER_ID_SHIFT: u32 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u32 = 0;

    /// Packs the three fields into an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if any field is wider than its slot.
    /// Values are never truncated into a neighbouring field.
    ///
    /// # Example
    /// ```
    /// use flakeid::SnowflakeId;
    ///
    /// let id = SnowflakeId::encode(1000, 5, 1).unwrap();
    /// assert_eq!(id.timestamp(), 1000);
    /// assert_eq!(id.worker_id(), 5);
    /// assert_eq!(id.sequence(), 1);
    /// ```
    pub const fn encode(timestamp: u64, worker_id: u64, sequence: u64) -> Result<Self> {
        if timestamp > Self::TIMESTAMP_MASK {
            return Err(Error::FieldOverflow {
                field: Field::Timestamp,
                value: timestamp,
                max: Self::TIMESTAMP_MASK,
            });
        }
        if worker_id > Self::WORKER_ID_MASK {
            return Err(Error::FieldOverflow {
                field: Field::WorkerId,
                value: worker_id,
                max: Self::WORKER_ID_MASK,
            });
        }
        if sequence > Self::SEQUENCE_MASK {
            return Err(Error::FieldOverflow {
                field: Field::Sequence,
                value: sequence,
                max: Self::SEQUENCE_MASK,
            });
        }
        Ok(Self::from_components_unchecked(timestamp, worker_id, sequence))
    }

    /// Packs fields that the caller has already range-checked.
    pub(crate) const fn from_components_unchecked(
        timestamp: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(worker_id <= Self::WORKER_ID_MASK, "worker_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self {
            id: (timestamp << Self::TIMESTAMP_SHIFT)
                | (worker_id << Self::WORKER_ID_SHIFT)
                | (sequence << Self::SEQUENCE_SHIFT),
        }
    }

    /// Splits the identifier back into its fields. Exact inverse of
    /// [`Self::encode`].
    pub const fn decode(self) -> Components {
        Components {
            timestamp: self.timestamp(),
            worker_id: self.worker_id(),
            sequence: self.sequence(),
        }
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the worker ID from the packed ID.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    pub const fn max_worker_id() -> u64 {
        Self::WORKER_ID_MASK
    }

    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns the raw integer, suitable for use as a storage key.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps a raw integer without validation. See [`Self::is_valid`].
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns `true` if the reserved top bit is clear, i.e. the value could
    /// have been produced by [`Self::encode`].
    pub const fn is_valid(&self) -> bool {
        self.id >> 63 == 0
    }

    /// Returns the ID as a zero-padded 20-digit string.
    ///
    /// Padded strings sort lexicographically in the same order as the raw
    /// integers.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("raw", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
