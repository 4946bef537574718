//! Tokensync: synchronization primitives built from rendezvous channels and actors.
//!
//! # Overview
//!
//! Tokensync provides a small toolkit of blocking synchronization primitives
//! that never share mutable state between threads directly. The only shared
//! building block is a bounded rendezvous channel; everything else is either
//! an actor that owns its state on a dedicated thread, or a protocol composed
//! from other primitives.
//!
//! # Core Guarantees
//!
//! - **Serialized state**: cells and events are owned by one actor thread each;
//!   every read and write is a message handled in order
//! - **Soft FIFO**: waiters on a [`sync::Lock`] or [`sync::Event`] are released
//!   in the order the underlying channel saw them
//! - **RAII release**: lock guards release on drop; promotion and demotion
//!   consume the guard they convert
//! - **Bounded polling**: the only retry loops are the writer wait in
//!   [`sync::RwLock`] and the acquirer wait in [`sync::Semaphore`], both with a
//!   configurable interval
//!
//! # Module Structure
//!
//! - [`channel`]: rendezvous channels and the token channel [`SyncChannel`]
//! - [`actor`]: thread-backed actors with rendezvous mailboxes
//! - [`sync`]: cells, event, lock, read-write lock, semaphore, barrier
//! - [`config`]: polling intervals and actor thread settings
//! - [`error`]: error types
//!
//! # Example
//!
//! ```
//! use tokensync::sync::{RwLock, Semaphore};
//!
//! let lock = RwLock::new();
//! let read = lock.read();
//! let write = read.promote();
//! drop(write);
//!
//! let sem = Semaphore::new(2, 2);
//! assert!(sem.try_acquire(2));
//! sem.release(2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod actor;
pub mod channel;
pub mod config;
pub mod error;
pub mod sync;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

// Re-exports for convenient access to core types
pub use channel::{ChannelOpResult, SyncChannel};
pub use config::SyncConfig;
pub use error::{ConfigError, WouldBlock};
pub use sync::{
    AtomicCell, Barrier, Destroy, Event, Lock, ReadGuard, RwLock, SafeCell, Semaphore, Unlock,
    WriteGuard,
};
