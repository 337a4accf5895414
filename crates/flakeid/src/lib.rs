//! Per-process Snowflake-style identifiers.
//!
//! A [`SnowflakeId`] packs a 41-bit millisecond offset from an epoch, an
//! 11-bit worker id and a 12-bit per-millisecond sequence into 64 bits, most
//! significant first. One generator never issues the same ID twice, even
//! under concurrent callers, and the IDs it issues sort in issuance order.
//!
//! Two generators are provided, both behind [`SnowflakeGenerator`]:
//!
//! - [`LockSnowflakeGenerator`] reads the clock on every call.
//! - [`TickedSnowflakeGenerator`] lets a background [`Ticker`] read the clock
//!   once per millisecond, so callers only touch the lock.
//!
//! ```
//! use flakeid::{LockSnowflakeGenerator, MonotonicClock, SnowflakeGenerator, CUSTOM_EPOCH};
//!
//! let generator = LockSnowflakeGenerator::new(42, CUSTOM_EPOCH, MonotonicClock::new()).unwrap();
//! let id = generator.generate().unwrap();
//! let fields = generator.decode(id);
//! assert_eq!(fields.worker_id, 42);
//! let key: u64 = id.into();
//! # let _ = key;
//! ```
//!
//! Worker ids are allocated outside this crate; a generator only checks that
//! the id is in range.

mod error;
mod generator;
mod id;
#[cfg(feature = "serde")]
mod serde;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
#[cfg(feature = "serde")]
pub use crate::serde::*;
pub use crate::time::*;
