//! Read-write lock with promotion and demotion.
//!
//! The lock is a protocol over weaker primitives rather than a state machine
//! of its own:
//!
//! | Part      | Primitive            | Role                                           |
//! |-----------|----------------------|------------------------------------------------|
//! | `write`   | [`Lock`]             | held by an active writer or a transition       |
//! | `read`    | [`Lock`]             | serializes concurrent read acquisitions        |
//! | `readers` | [`AtomicCell<i64>`]  | number of outstanding read guards              |
//! | `release` | [`SyncChannel`] (0)  | "a reader just left" hint for a waiting writer |
//!
//! # Protocol
//!
//! - **Read**: take `read`, take and immediately return `write`, increment
//!   `readers`. Holding `write` for the increment excludes an active writer
//!   and any reader-count transition; `read` keeps concurrent readers from
//!   mistaking each other's brief hold of `write` for a writer.
//! - **Write**: take `write`, then wait until `readers == 0`.
//! - **Promote**: take `write`, wait until `readers == 1` (only the caller
//!   left), then move the count `1 -> 0`.
//! - **Demote**: move the count `0 -> 1`, then return `write`.
//! - **Release (read)**: decrement `readers`, then poke `release` without
//!   blocking.
//!
//! A reader's decrement-then-poke is not atomic with a writer's check, so
//! waiting writers sleep on `release` for at most
//! [`SyncConfig::rwlock_poll_interval`] before rechecking. The poll bounds
//! how stale the writer's view can get.
//!
//! ## Fairness Characteristics
//!
//! | Scenario                  | Behavior                                           |
//! |---------------------------|----------------------------------------------------|
//! | No writer active          | Readers acquire after a constant bookkeeping step  |
//! | Writer active             | New readers wait for `write`                       |
//! | Writer waiting on readers | Writer holds `write`, so new readers queue behind  |
//! | Multiple writers          | Admitted in the order `write` observed them        |
//!
//! There is no separate writer-priority mechanism: a writer that has not yet
//! taken `write` competes with arriving readers on equal terms.
//!
//! # Misuse
//!
//! Two readers promoting at the same time deadlock: the one holding `write`
//! waits for the other to stop reading, the other waits for `write`. Use
//! [`ReadGuard::try_promote`] where that can happen.

use std::fmt;
use std::mem;
use std::time::Duration;

use crate::channel::SyncChannel;
use crate::config::SyncConfig;
use crate::error::{WouldBlock, INCONSISTENT_STATE};
use crate::sync::{AtomicCell, Lock, Unlock};

/// Error returned by [`ReadGuard::try_promote`]. Hands the read guard back.
pub struct TryPromoteError<'a> {
    guard: ReadGuard<'a>,
}

impl<'a> TryPromoteError<'a> {
    /// Recovers the still-held read guard.
    pub fn into_guard(self) -> ReadGuard<'a> {
        self.guard
    }
}

impl fmt::Debug for TryPromoteError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryPromoteError").finish_non_exhaustive()
    }
}

impl fmt::Display for TryPromoteError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "read lock cannot be promoted right now")
    }
}

impl std::error::Error for TryPromoteError<'_> {}

/// A read-write lock guarding no data of its own.
///
/// # Example
///
/// ```
/// use tokensync::sync::RwLock;
///
/// let lock = RwLock::new();
/// let r1 = lock.read();
/// let r2 = lock.read();
/// assert_eq!(lock.readers(), 2);
/// assert!(lock.try_write().is_err());
///
/// r2.release();
/// let w = r1.promote();
/// assert_eq!(lock.readers(), 0);
/// let r = w.demote();
/// assert_eq!(lock.readers(), 1);
/// drop(r);
/// ```
pub struct RwLock {
    write: Lock,
    read: Lock,
    readers: AtomicCell<i64>,
    release: SyncChannel,
    poll_interval: Duration,
}

impl RwLock {
    /// Creates an unlocked read-write lock with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the reader-count actor thread cannot be spawned.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    /// Creates an unlocked read-write lock.
    ///
    /// # Panics
    ///
    /// Panics if the reader-count actor thread cannot be spawned.
    #[must_use]
    pub fn with_config(config: &SyncConfig) -> Self {
        Self {
            write: Lock::new(),
            read: Lock::new(),
            readers: AtomicCell::with_config(0, config),
            release: SyncChannel::new(),
            poll_interval: config.rwlock_poll_interval,
        }
    }

    /// Acquires shared access, blocking while a writer or a transition holds
    /// the lock.
    pub fn read(&self) -> ReadGuard<'_> {
        let serial = self.read.acquire();
        let write = self.write.acquire();
        self.readers.increment();
        drop(write);
        drop(serial);
        ReadGuard { lock: self }
    }

    /// Acquires shared access if no writer or transition holds the lock.
    ///
    /// Waits out another reader's bookkeeping step on `read`; only a held
    /// `write` makes this fail. A reader already parked in [`read`](Self::read)
    /// behind a writer holds `read`, so this then waits for that writer too.
    pub fn try_read(&self) -> Result<ReadGuard<'_>, WouldBlock> {
        let serial = self.read.acquire();
        let write = self.write.try_acquire()?;
        self.readers.increment();
        drop(write);
        drop(serial);
        Ok(ReadGuard { lock: self })
    }

    /// Acquires exclusive access, waiting for outstanding readers to leave.
    pub fn write(&self) -> WriteGuard<'_> {
        let unlock = self.write.acquire();
        self.wait_for_readers(0);
        WriteGuard { lock: self, unlock }
    }

    /// Acquires exclusive access only if nobody holds the lock right now.
    pub fn try_write(&self) -> Result<WriteGuard<'_>, WouldBlock> {
        let unlock = self.write.try_acquire()?;
        if self.readers.read() != 0 {
            return Err(WouldBlock);
        }
        Ok(WriteGuard { lock: self, unlock })
    }

    /// Number of outstanding read guards.
    #[must_use]
    pub fn readers(&self) -> i64 {
        self.readers.read()
    }

    /// Polls the reader count until it equals `target`. Caller holds `write`.
    fn wait_for_readers(&self, target: i64) {
        let mut polls: u64 = 0;
        loop {
            let readers = self.readers.read();
            if readers == target {
                break;
            }
            polls += 1;
            tracing::trace!(readers, target, polls, "rwlock waiting for readers");
            let _ = self.release.timeout_recv(self.poll_interval);
        }
        if polls > 0 {
            tracing::trace!(target, polls, "rwlock reader wait finished");
        }
    }

    /// Moves the reader count from `from` to `to`. The caller holds `write`,
    /// so nothing else can change the count in between.
    fn transition(&self, from: i64, to: i64) {
        assert!(
            self.readers.write(from, to),
            "{INCONSISTENT_STATE}: reader count transition {from} -> {to} failed"
        );
    }
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RwLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwLock")
            .field("write", &self.write)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Shared access to a [`RwLock`].
///
/// Released on drop or via [`release`](Self::release); may instead be turned
/// into a [`WriteGuard`] with [`promote`](Self::promote).
#[must_use = "guard will be immediately released if not held"]
pub struct ReadGuard<'a> {
    lock: &'a RwLock,
}

impl<'a> ReadGuard<'a> {
    /// Releases shared access.
    pub fn release(self) {}

    /// Upgrades to exclusive access once this is the only reader left.
    ///
    /// Blocks on `write`, then polls until every other reader has released.
    /// Other readers are not disturbed while this waits.
    pub fn promote(self) -> WriteGuard<'a> {
        let lock = self.lock;
        let unlock = lock.write.acquire();
        lock.wait_for_readers(1);
        lock.transition(1, 0);
        mem::forget(self);
        WriteGuard { lock, unlock }
    }

    /// Upgrades to exclusive access if this is the only reader and nobody
    /// holds `write` right now. On failure the read guard is handed back.
    pub fn try_promote(self) -> Result<WriteGuard<'a>, TryPromoteError<'a>> {
        let lock = self.lock;
        let Ok(unlock) = lock.write.try_acquire() else {
            return Err(TryPromoteError { guard: self });
        };
        if lock.readers.read() != 1 {
            drop(unlock);
            return Err(TryPromoteError { guard: self });
        }
        lock.transition(1, 0);
        mem::forget(self);
        Ok(WriteGuard { lock, unlock })
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        let remaining = self.lock.readers.decrement();
        if remaining < 0 && !std::thread::panicking() {
            panic!("{INCONSISTENT_STATE}: reader count went negative ({remaining})");
        }
        // Best effort: only lands if a writer is parked on the notifier.
        let _ = self.lock.release.try_send();
    }
}

impl fmt::Debug for ReadGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadGuard").finish_non_exhaustive()
    }
}

/// Exclusive access to a [`RwLock`].
///
/// Released on drop or via [`release`](Self::release); may instead be turned
/// into a [`ReadGuard`] with [`demote`](Self::demote).
#[must_use = "guard will be immediately released if not held"]
pub struct WriteGuard<'a> {
    lock: &'a RwLock,
    unlock: Unlock<'a>,
}

impl<'a> WriteGuard<'a> {
    /// Releases exclusive access.
    pub fn release(self) {}

    /// Downgrades to shared access without ever leaving the lock unheld.
    /// Never blocks.
    pub fn demote(self) -> ReadGuard<'a> {
        let Self { lock, unlock } = self;
        lock.transition(0, 1);
        drop(unlock);
        ReadGuard { lock }
    }
}

impl fmt::Debug for WriteGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteGuard").finish_non_exhaustive()
    }
}
