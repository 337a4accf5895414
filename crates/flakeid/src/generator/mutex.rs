#[cfg(feature = "parking-lot")]
pub use parking_lot::{Mutex, MutexGuard};
#[cfg(not(feature = "parking-lot"))]
pub use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;

/// Locks `mutex`, mapping poisoning to [`Error::LockPoisoned`] when the std
/// mutex is in use.
///
/// [`Error::LockPoisoned`]: crate::Error
#[inline]
pub(crate) fn lock_state<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    #[cfg(feature = "parking-lot")]
    {
        Ok(mutex.lock())
    }
    #[cfg(not(feature = "parking-lot"))]
    {
        Ok(mutex.lock()?)
    }
}
