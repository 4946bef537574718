//! Synchronization primitives built on rendezvous channels.
//!
//! Nothing in this module touches a native mutex or condition variable
//! directly. Every primitive is either an actor that owns its state and
//! serializes access through its mailbox, or a protocol composed from
//! other primitives here.
//!
//! # Primitives
//!
//! - [`AtomicCell`] / [`SafeCell`]: actor-owned values with compare-and-write
//!   or unconditional writes
//! - [`Event`]: one-to-many notification with FIFO subscribers
//! - [`Lock`]: binary mutual exclusion with FIFO admission
//! - [`RwLock`]: read-write lock with promotion and demotion
//! - [`Semaphore`]: counting semaphore over a fixed pool of units
//! - [`Barrier`]: one-shot two-party handshake
//!
//! # Composition
//!
//! | Primitive   | Built from                                   |
//! |-------------|----------------------------------------------|
//! | `Lock`      | capacity-1 `SyncChannel`                     |
//! | `Event`     | actor + one capacity-1 ticket per subscriber |
//! | `RwLock`    | two `Lock`s, `AtomicCell<i64>`, notifier     |
//! | `Semaphore` | `AtomicCell<usize>`, `Event`                 |
//! | `Barrier`   | unbuffered `SyncChannel`                     |
//!
//! # Guards
//!
//! Lock-like acquisitions return RAII guards ([`Unlock`], [`ReadGuard`],
//! [`WriteGuard`]) that release on drop. Promotion and demotion consume the
//! guard they convert.

mod barrier;
mod cell;
mod event;
mod lock;
mod rwlock;
mod semaphore;

pub use barrier::Barrier;
pub use cell::{AtomicCell, CellValue, SafeCell};
pub use event::Event;
pub use lock::{Lock, Unlock};
pub use rwlock::{ReadGuard, RwLock, TryPromoteError, WriteGuard};
pub use semaphore::Semaphore;

/// Capability to tear a primitive down for good.
///
/// After `destroy`, pending and future waiters observe a closed primitive
/// instead of blocking. Destroying twice is a no-op.
pub trait Destroy {
    /// Tears the primitive down.
    fn destroy(&self);
}
