//! Binary mutual-exclusion lock.
//!
//! The lock is a capacity-1 [`SyncChannel`]: acquiring deposits the single
//! token, releasing takes it back out. Waiters park as senders on the
//! channel and are admitted in the order the channel first saw them.

use std::fmt;

use crate::channel::SyncChannel;
use crate::error::{WouldBlock, INCONSISTENT_STATE};

/// A mutual-exclusion token.
///
/// # Example
///
/// ```
/// use tokensync::sync::Lock;
///
/// let lock = Lock::new();
/// let held = lock.acquire();
/// assert!(lock.try_acquire().is_err());
/// held.release();
/// assert!(lock.try_acquire().is_ok());
/// ```
pub struct Lock {
    token: SyncChannel,
}

impl Lock {
    /// Creates an unheld lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: SyncChannel::with_capacity(1),
        }
    }

    /// Blocks until the lock is free and takes it.
    pub fn acquire(&self) -> Unlock<'_> {
        self.token.send();
        Unlock { lock: self }
    }

    /// Takes the lock if it is free right now.
    pub fn try_acquire(&self) -> Result<Unlock<'_>, WouldBlock> {
        if self.token.try_send().is_success() {
            Ok(Unlock { lock: self })
        } else {
            Err(WouldBlock)
        }
    }

    /// Returns true if the token is currently held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        !self.token.is_empty()
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// Capability to release one acquisition of a [`Lock`].
///
/// The lock is released when this is dropped or passed to
/// [`release`](Self::release).
#[must_use = "the lock is released as soon as the Unlock is dropped"]
pub struct Unlock<'a> {
    lock: &'a Lock,
}

impl Unlock<'_> {
    /// Returns the token, admitting the next waiter.
    pub fn release(self) {}
}

impl Drop for Unlock<'_> {
    fn drop(&mut self) {
        let released = self.lock.token.try_recv();
        if !released.is_success() && !std::thread::panicking() {
            panic!("{INCONSISTENT_STATE}: lock released while not held ({released:?})");
        }
    }
}

impl fmt::Debug for Unlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unlock").finish_non_exhaustive()
    }
}
