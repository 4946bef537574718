//! Rendezvous channels.
//!
//! Every blocking operation in this crate bottoms out in one of these:
//!
//! - [`Channel`]: a bounded FIFO of values with an open/closed lifecycle.
//!   Actor mailboxes and reply slots are built from it.
//! - [`SyncChannel`]: the same queue carrying content-free tokens, reporting
//!   outcomes as [`ChannelOpResult`].
//!
//! # Example
//!
//! ```
//! use tokensync::channel::{ChannelOpResult, SyncChannel};
//!
//! let ch = SyncChannel::with_capacity(1);
//! assert_eq!(ch.try_send(), ChannelOpResult::Success);
//! assert_eq!(ch.try_send(), ChannelOpResult::Failure);
//! assert_eq!(ch.recv(), ChannelOpResult::Success);
//! ```

pub mod rendezvous;
pub mod signal;

pub use rendezvous::{Channel, RecvError, TrySendError};
pub use signal::{timeout, ChannelOpResult, SyncChannel};
