//! Actor-owned value cells.
//!
//! Both flavors keep their value on a dedicated actor thread and serialize
//! every read and write through its mailbox, so a reader never observes a
//! value mid-write and two writers never interleave.
//!
//! - [`SafeCell`]: unconditional writes that hand back the previous value.
//! - [`AtomicCell`]: compare-and-write; the write lands only if the current
//!   value equals the expected one when the actor processes the request.
//!
//! # Example
//!
//! ```
//! use tokensync::sync::AtomicCell;
//!
//! let cell = AtomicCell::new(1_i64);
//! assert!(cell.write(1, 5));
//! assert!(!cell.write(1, 9));
//! assert_eq!(cell.read(), 5);
//! assert_eq!(cell.increment(), 6);
//! ```

use std::fmt;
use std::ops::{Add, Sub};

use crate::actor::{self, Actor, ActorHandle, Reply};
use crate::config::SyncConfig;

/// Bound shared by every cell value type.
pub trait CellValue: Clone + PartialEq + Send + 'static {}

impl<T: Clone + PartialEq + Send + 'static> CellValue for T {}

enum CellRequest<T> {
    Read(Reply<T>),
    Replace {
        val: T,
        reply: Reply<T>,
    },
    CompareAndSet {
        old: T,
        val: T,
        reply: Reply<bool>,
    },
}

struct CellActor<T> {
    value: T,
}

impl<T: CellValue> Actor for CellActor<T> {
    type Message = CellRequest<T>;

    fn handle(&mut self, msg: CellRequest<T>) {
        match msg {
            CellRequest::Read(reply) => reply.send(self.value.clone()),
            CellRequest::Replace { val, reply } => {
                reply.send(std::mem::replace(&mut self.value, val));
            }
            CellRequest::CompareAndSet { old, val, reply } => {
                let swapped = self.value == old;
                if swapped {
                    self.value = val;
                }
                reply.send(swapped);
            }
        }
    }
}

/// A value cell with compare-and-write semantics.
pub struct AtomicCell<T: CellValue> {
    actor: ActorHandle<CellActor<T>>,
}

impl<T: CellValue> AtomicCell<T> {
    /// Spawns a cell actor holding `val`.
    ///
    /// # Panics
    ///
    /// Panics if the actor thread cannot be spawned.
    #[must_use]
    pub fn new(val: T) -> Self {
        Self::with_config(val, &SyncConfig::default())
    }

    /// Like [`new`](Self::new), naming the actor thread from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the actor thread cannot be spawned.
    #[must_use]
    pub fn with_config(val: T, config: &SyncConfig) -> Self {
        Self {
            actor: actor::spawn_or_panic("atomic-cell", CellActor { value: val }, config),
        }
    }

    /// Returns the current value.
    #[must_use]
    pub fn read(&self) -> T {
        self.actor.call(CellRequest::Read)
    }

    /// Sets the value to `val` iff it currently equals `old`. Returns whether
    /// the write happened.
    #[must_use = "a failed compare-and-write must be handled"]
    pub fn write(&self, old: T, val: T) -> bool {
        self.actor
            .call(|reply| CellRequest::CompareAndSet { old, val, reply })
    }

    /// Optimistically applies `f` until a compare-and-write lands, returning
    /// the value written.
    pub fn update(&self, mut f: impl FnMut(&T) -> T) -> T {
        loop {
            let current = self.read();
            let next = f(&current);
            if self.write(current, next.clone()) {
                return next;
            }
            tracing::trace!("cell update lost a race, retrying");
        }
    }
}

impl<T> AtomicCell<T>
where
    T: CellValue + Copy + Add<Output = T> + Sub<Output = T> + From<u8>,
{
    /// One attempt at `v -> v + 1`. Returns false if another writer raced.
    #[must_use = "a failed attempt must be retried or handled"]
    pub fn try_increment(&self) -> bool {
        let v = self.read();
        self.write(v, v + T::from(1))
    }

    /// One attempt at `v -> v - 1`. Returns false if another writer raced.
    #[must_use = "a failed attempt must be retried or handled"]
    pub fn try_decrement(&self) -> bool {
        let v = self.read();
        self.write(v, v - T::from(1))
    }

    /// Adds one, retrying on lost races. Returns the new value.
    pub fn increment(&self) -> T {
        self.update(|&v| v + T::from(1))
    }

    /// Subtracts one, retrying on lost races. Returns the new value.
    pub fn decrement(&self) -> T {
        self.update(|&v| v - T::from(1))
    }
}

impl<T: CellValue + fmt::Debug> fmt::Debug for AtomicCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicCell")
            .field("stopped", &self.actor.is_stopped())
            .finish_non_exhaustive()
    }
}

/// A value cell with unconditional writes.
pub struct SafeCell<T: CellValue> {
    actor: ActorHandle<CellActor<T>>,
}

impl<T: CellValue> SafeCell<T> {
    /// Spawns a cell actor holding `val`.
    ///
    /// # Panics
    ///
    /// Panics if the actor thread cannot be spawned.
    #[must_use]
    pub fn new(val: T) -> Self {
        Self::with_config(val, &SyncConfig::default())
    }

    /// Like [`new`](Self::new), naming the actor thread from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the actor thread cannot be spawned.
    #[must_use]
    pub fn with_config(val: T, config: &SyncConfig) -> Self {
        Self {
            actor: actor::spawn_or_panic("safe-cell", CellActor { value: val }, config),
        }
    }

    /// Returns the current value.
    #[must_use]
    pub fn read(&self) -> T {
        self.actor.call(CellRequest::Read)
    }

    /// Replaces the value, returning the one it held just before.
    pub fn write(&self, val: T) -> T {
        self.actor.call(|reply| CellRequest::Replace { val, reply })
    }
}

impl<T: CellValue + fmt::Debug> fmt::Debug for SafeCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeCell")
            .field("stopped", &self.actor.is_stopped())
            .finish_non_exhaustive()
    }
}
