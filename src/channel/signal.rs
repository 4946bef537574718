//! Content-free signal channel.
//!
//! [`SyncChannel`] carries unit tokens and nothing else. It is the
//! suspension point shared by [`Lock`](crate::sync::Lock), the release
//! notifier of [`RwLock`](crate::sync::RwLock), event tickets and the
//! [`Barrier`](crate::sync::Barrier). Clones share the same queue.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::rendezvous::{Channel, RecvError};

/// Outcome of a channel-level operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum ChannelOpResult {
    /// The operation went through.
    Success,
    /// A non-blocking attempt could not proceed right now.
    Failure,
    /// A bounded wait expired.
    Timeout,
    /// The channel (or event) was torn down.
    Closed,
}

impl ChannelOpResult {
    /// Returns true for [`ChannelOpResult::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true for [`ChannelOpResult::Closed`].
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl<T> From<Result<T, RecvError>> for ChannelOpResult {
    fn from(result: Result<T, RecvError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(RecvError::Empty) => Self::Failure,
            Err(RecvError::Timeout) => Self::Timeout,
            Err(RecvError::Closed) => Self::Closed,
        }
    }
}

/// A bounded queue of signal tokens.
#[derive(Debug, Clone)]
pub struct SyncChannel {
    inner: Arc<Channel<()>>,
}

impl SyncChannel {
    /// Creates an unbuffered channel: a send completes only by handing its
    /// token to a receiver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a channel buffering up to `capacity` tokens.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Channel::new(capacity)),
        }
    }

    /// Sends a token, blocking until there is room.
    ///
    /// # Panics
    ///
    /// Panics if the channel is closed before or while blocking.
    pub fn send(&self) {
        self.inner.send(());
    }

    /// Sends a token if there is room right now.
    ///
    /// Returns [`ChannelOpResult::Success`] or [`ChannelOpResult::Failure`].
    ///
    /// # Panics
    ///
    /// Panics if the channel is closed.
    pub fn try_send(&self) -> ChannelOpResult {
        match self.inner.try_send(()) {
            Ok(()) => ChannelOpResult::Success,
            Err(_) => ChannelOpResult::Failure,
        }
    }

    /// Blocks until a token is received or the channel closes.
    pub fn recv(&self) -> ChannelOpResult {
        self.inner.recv().into()
    }

    /// Receives a token without blocking.
    pub fn try_recv(&self) -> ChannelOpResult {
        self.inner.try_recv().into()
    }

    /// Blocks for at most `timeout` waiting for a token.
    pub fn timeout_recv(&self, timeout: Duration) -> ChannelOpResult {
        self.inner.recv_timeout(timeout).into()
    }

    /// Closes the channel. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.inner.close()
    }

    /// Returns true once the channel is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Number of tokens waiting to be received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no token is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Returns true if both handles refer to the same queue.
    #[must_use]
    pub fn same_channel(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn offer(&self) -> bool {
        self.inner.offer(()).is_ok()
    }
}

impl Default for SyncChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a channel that becomes receivable once `duration` has elapsed.
///
/// A helper thread sleeps for `duration` and then deposits a single token.
/// Closing the returned channel early makes the helper a no-op.
///
/// # Panics
///
/// Panics if the OS refuses to spawn the helper thread.
#[must_use]
pub fn timeout(duration: Duration) -> SyncChannel {
    let channel = SyncChannel::with_capacity(1);
    let signal = channel.clone();
    thread::Builder::new()
        .name("tokensync-timeout".into())
        .spawn(move || {
            thread::sleep(duration);
            if !signal.offer() {
                tracing::trace!(?duration, "timeout fired on a closed channel");
            }
        })
        .unwrap_or_else(|err| panic!("failed to spawn timeout thread: {err}"));
    channel
}
